//! File flag resolution
//!
//! A command reads from one of, in order: the positional target file,
//! `--input`, or `<module>.ndjson` with `--named`. It writes to the target
//! file, `--output`, the named file, or stdout. Combinations where a flag
//! would be ignored are rejected.

use crate::error::{AppError, InputError, IoError};
use crate::output::OutputTarget;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::{Path, PathBuf};

/// The raw file flags of a command
#[derive(Debug, Clone, Default)]
pub struct FileFlags {
    pub target_file: Option<PathBuf>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub named: bool,
}

/// How the input file was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    TargetFile,
    InputFlag,
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub origin: InputOrigin,
}

/// Resolved input and output of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFiles {
    pub input: Option<InputFile>,
    pub output: OutputTarget,
}

/// Validate the file flags and resolve them into an input and an output.
///
/// `module` names the file used by `--named`.
pub fn resolve_files(flags: &FileFlags, module: Option<&str>) -> Result<ResolvedFiles, InputError> {
    let target = flags.target_file.is_some();
    let output = flags.output.is_some();

    if flags.input.is_some() {
        if target && output {
            return Err(InputError::conflicting(
                "target file is superfluous when both --input and --output have been set",
            ));
        }
        if flags.named && output {
            return Err(InputError::conflicting(
                "--named is superfluous when both --input and --output have been set",
            ));
        }
    } else {
        if target && output {
            return Err(InputError::conflicting(
                "target file is superfluous when --output has been set",
            ));
        }
        if flags.named && output {
            return Err(InputError::conflicting(
                "--named is superfluous when --output has been set",
            ));
        }
    }

    if target && flags.named {
        return Err(InputError::conflicting(
            "--named is superfluous when target file is given",
        ));
    }

    let named = module
        .filter(|_| flags.named)
        .map(|module| PathBuf::from(format!("{}.ndjson", module)));

    let input = if let Some(path) = &flags.target_file {
        Some(InputFile {
            path: path.clone(),
            origin: InputOrigin::TargetFile,
        })
    } else if let Some(path) = &flags.input {
        Some(InputFile {
            path: path.clone(),
            origin: InputOrigin::InputFlag,
        })
    } else {
        named.clone().map(|path| InputFile {
            path,
            origin: InputOrigin::Named,
        })
    };

    let output = flags
        .target_file
        .clone()
        .or_else(|| flags.output.clone())
        .or(named)
        .map_or(OutputTarget::Stdout, OutputTarget::File);

    Ok(ResolvedFiles { input, output })
}

/// Open an input file.
///
/// A missing file is `Ok(None)` unless `required`, in which case it is an
/// input error.
pub fn open_file(path: &Path, required: bool) -> Result<Option<Box<dyn BufRead>>, AppError> {
    match File::open(path) {
        Ok(file) => Ok(Some(Box::new(BufReader::new(file)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if required {
                Err(InputError::NoSuchFile {
                    path: path.to_path_buf(),
                }
                .into())
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(IoError::read(path, e).into()),
    }
}

/// Open the input of a command that needs one: the resolved file, or stdin
/// when it is not a terminal
pub fn open_required_input(input: Option<&InputFile>) -> Result<Box<dyn BufRead>, AppError> {
    if let Some(input) = input {
        return open_file(&input.path, true)?.ok_or_else(|| {
            InputError::NoSuchFile {
                path: input.path.clone(),
            }
            .into()
        });
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(InputError::missing_input(
            "expected a target file, --input or data on stdin",
        )
        .into());
    }
    Ok(Box::new(stdin.lock()))
}
