use {
    crate::factory::ContractFactory,
    alloy::{json_abi::JsonAbi, primitives::Bytes},
    serde::Deserialize,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Source of compiled contracts.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
pub trait ArtifactSource: Send + Sync {
    /// Returns the factory for the contract with the given name. The name is
    /// either a bare contract name (`FortuneWheel`) or a fully qualified one
    /// (`contracts/FortuneWheel.sol:FortuneWheel`).
    fn factory(&self, name: &str) -> Result<ContractFactory, ArtifactError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("no artifact for contract {name} under {}", root.display())]
    NotFound { name: String, root: PathBuf },
    #[error("contract name {name} is ambiguous, candidates: {paths:?}")]
    Ambiguous { name: String, paths: Vec<PathBuf> },
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("artifact of {name} has invalid bytecode")]
    InvalidBytecode {
        name: String,
        #[source]
        source: const_hex::FromHexError,
    },
    #[error("artifact of {name} has no bytecode, it is probably an interface or abstract contract")]
    NoBytecode { name: String },
    #[error("bytecode of {name} references libraries that need to be linked first")]
    UnlinkedLibraries { name: String },
}

/// Artifacts produced by Hardhat (`artifacts/`) or Foundry (`out/`).
///
/// Both lay artifacts out as `<source file>/<contract name>.json`, Hardhat
/// additionally nests them in `contracts/`.
#[derive(Clone, Debug)]
pub struct Artifacts {
    root: PathBuf,
}

/// Directories that contain compiler bookkeeping instead of contract
/// artifacts.
const SKIPPED_DIRS: &[&str] = &["build-info", "cache"];

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{}.json", contract_name(name));
        if let Some((source, contract)) = name.split_once(':') {
            return [
                self.root.join(source).join(format!("{contract}.json")),
                self.root
                    .join(Path::new(source).file_name().unwrap_or_default())
                    .join(format!("{contract}.json")),
            ]
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| ArtifactError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            });
        }

        let mut found = Vec::new();
        find_files(&self.root, &file_name, &mut found).map_err(|source| ArtifactError::Io {
            path: self.root.clone(),
            source,
        })?;
        found.sort();

        match found.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                root: self.root.clone(),
            }),
            1 => Ok(found.remove(0)),
            _ => Err(ArtifactError::Ambiguous {
                name: name.to_string(),
                paths: found,
            }),
        }
    }
}

impl ArtifactSource for Artifacts {
    fn factory(&self, name: &str) -> Result<ContractFactory, ArtifactError> {
        let path = self.locate(name)?;
        tracing::debug!(name, path = %path.display(), "loading artifact");
        let content = fs::read(&path).map_err(|source| ArtifactError::Io {
            path: path.clone(),
            source,
        })?;
        parse(contract_name(name), &path, &content)
    }
}

fn contract_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, contract)| contract)
}

fn find_files(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            let skipped = entry
                .file_name()
                .to_str()
                .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            if !skipped {
                find_files(&path, file_name, found)?;
            }
        } else if entry.file_name().to_str() == Some(file_name) {
            found.push(path);
        }
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: RawBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat stores the bytecode as a plain hex string.
    Hex(String),
    /// Foundry stores it alongside source maps and link references.
    Object { object: String },
}

fn parse(name: &str, path: &Path, content: &[u8]) -> Result<ContractFactory, ArtifactError> {
    let artifact: RawArtifact =
        serde_json::from_slice(content).map_err(|source| ArtifactError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    let hex = match &artifact.bytecode {
        RawBytecode::Hex(hex) | RawBytecode::Object { object: hex } => hex.as_str(),
    };

    // Unlinked library references are encoded as `__$<hash>$__` placeholders.
    if hex.contains("__") {
        return Err(ArtifactError::UnlinkedLibraries {
            name: name.to_string(),
        });
    }
    let bytecode = const_hex::decode(hex).map_err(|source| ArtifactError::InvalidBytecode {
        name: name.to_string(),
        source,
    })?;
    if bytecode.is_empty() {
        return Err(ArtifactError::NoBytecode {
            name: name.to_string(),
        });
    }

    Ok(ContractFactory::new(
        name,
        artifact.abi,
        Bytes::from(bytecode),
    ))
}
