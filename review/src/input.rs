//! Reading PGN text from a file or stdin.

use std::io::Read;
use std::path::Path;

use chess::MAX_PGN_LENGTH;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {length} bytes, larger than the {max} byte limit")]
    TooLarge {
        path: String,
        length: u64,
        max: usize,
    },
}

/// Read PGN text from `path`, where `-` means stdin. Inputs larger than
/// [`MAX_PGN_LENGTH`] are rejected without being read in full.
pub fn read_pgn_input(path: &Path) -> Result<String, InputError> {
    let name = path.display().to_string();
    let io_err = |source| InputError::Io {
        path: name.clone(),
        source,
    };

    let mut text = String::new();
    if path == Path::new("-") {
        std::io::stdin()
            .lock()
            .take(MAX_PGN_LENGTH as u64 + 1)
            .read_to_string(&mut text)
            .map_err(io_err)?;
    } else {
        let file = std::fs::File::open(path).map_err(io_err)?;
        let length = file.metadata().map_err(io_err)?.len();
        if length > MAX_PGN_LENGTH as u64 {
            return Err(InputError::TooLarge {
                path: name,
                length,
                max: MAX_PGN_LENGTH,
            });
        }
        file.take(MAX_PGN_LENGTH as u64 + 1)
            .read_to_string(&mut text)
            .map_err(io_err)?;
    }

    if text.len() > MAX_PGN_LENGTH {
        return Err(InputError::TooLarge {
            path: name,
            length: text.len() as u64,
            max: MAX_PGN_LENGTH,
        });
    }

    tracing::debug!(path = %name, bytes = text.len(), "Read PGN input");
    Ok(text)
}
