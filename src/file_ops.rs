//! File encryption/decryption operations
//!
//! Path-level wrappers around [`FileCodec`]: open the input, obtain the
//! passphrase, stream into a temporary file, and move it into place.

use crate::codec::{FileCodec, Mode};
use crate::error::{ErrorCategory, ErrorKind, Result, SaltedError};
use crate::kdf;
use crate::passphrase::PassphraseReader;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const IO_BUFFER_SIZE: usize = 64 * 1024;

/// Encrypt a file with a passphrase
///
/// The output file is created with mode 0o600 (read/write for owner only)
/// on Unix systems.
pub fn encrypt_file(
    codec: &FileCodec<'_>,
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<u64> {
    process_file(codec, Mode::Encrypt, input_path, output_path, passphrase_reader)
}

/// Decrypt a file with a passphrase
///
/// On a bad decrypt the output file is left behind holding the
/// un-truncated plaintext attempt; it should be treated as garbage.
pub fn decrypt_file(
    codec: &FileCodec<'_>,
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<u64> {
    process_file(codec, Mode::Decrypt, input_path, output_path, passphrase_reader)
}

/// Runs one operation from `input_path` to `output_path`.
///
/// The input is opened before anything else happens, so a missing input
/// never creates or clobbers the output. The output is built in a temporary
/// file next to `output_path` and renamed over it once the codec is done,
/// which also makes `input_path == output_path` safe. A bad decrypt still
/// publishes its un-truncated output; any other failure leaves
/// `output_path` as it was.
pub fn process_file(
    codec: &FileCodec<'_>,
    mode: Mode,
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<u64> {
    let input = File::open(input_path).map_err(|e| open_input_error(input_path, e))?;
    kdf::check_iterations(codec.iterations())?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let mut output = create_output(output_path)?;

    let source = BufReader::with_capacity(IO_BUFFER_SIZE, input);
    let destination = BufWriter::with_capacity(IO_BUFFER_SIZE, output.as_file_mut());
    let result = codec.run(mode, source, destination, &passphrase);

    match &result {
        Ok(_) => persist_output(output, output_path)?,
        Err(e) if e.is(ErrorKind::BadDecrypt) => persist_output(output, output_path)?,
        Err(_) => debug!(output = %output_path.display(), "discarding partial output"),
    }

    result.map_err(|e| {
        let verb = match mode {
            Mode::Encrypt => "encrypt",
            Mode::Decrypt => "decrypt",
        };
        let msg = format!(
            "failed to {} {} to {}: {}",
            verb,
            input_path.display(),
            output_path.display(),
            e.message()
        );
        e.with_context(msg)
    })
}

/// Create a temporary file beside `path` with secure permissions (0o600 on Unix)
fn create_output(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        SaltedError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to create temporary file in {}", dir.display()),
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(|e| SaltedError::io("failed to set temporary file permissions", e))?;
    }

    Ok(temp_file)
}

/// Sync the temporary file and rename it over `path`
fn persist_output(temp_file: NamedTempFile, path: &Path) -> Result<()> {
    // fsync first so the rename, once it lands, always points at the full output.
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| SaltedError::io("failed to sync output prior to rename", e))?;
    temp_file.persist(path).map_err(|e| {
        SaltedError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename output to {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn open_input_error(path: &Path, err: io::Error) -> SaltedError {
    if err.kind() == io::ErrorKind::NotFound {
        SaltedError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InputNotFound,
            format!("input file {} does not exist", path.display()),
            err,
        )
    } else {
        SaltedError::io(format!("failed to open {}", path.display()), err)
    }
}
