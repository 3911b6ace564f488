use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::StackError;
use crate::template::{sub, BOOTSTRAP_QUALIFIER};

pub const ASSET_MANIFEST_VERSION: &str = "36.0.0";

/// Zipped Lambda code identified by the handler binary it packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAsset {
    pub source_id: String,
}

impl CodeAsset {
    pub fn for_binary(binary_name: &str) -> Self {
        Self {
            source_id: binary_name.to_string(),
        }
    }

    pub fn zip_name(&self) -> String {
        format!("{}.zip", self.source_id)
    }

    /// Hashes the packaged zip in `asset_dir` when present, otherwise the
    /// source id, so templates stay stable before packaging has run.
    pub fn resolve(&self, asset_dir: Option<&Path>) -> Result<ResolvedAsset, StackError> {
        let expected = asset_dir.map(|dir| dir.join(self.zip_name()));
        let packaged = expected.clone().filter(|path| path.is_file());

        let hash = match &packaged {
            Some(path) => {
                let bytes = fs::read(path).map_err(|source| StackError::AssetRead {
                    path: path.clone(),
                    source,
                })?;
                sha256_hex(&bytes)
            }
            None => sha256_hex(self.source_id.as_bytes()),
        };

        let source_path = match expected {
            Some(path) => absolute_path(&path)?,
            None => PathBuf::from(self.zip_name()),
        };

        Ok(ResolvedAsset {
            source_id: self.source_id.clone(),
            hash,
            packaged_path: packaged,
            source_path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub source_id: String,
    pub hash: String,
    pub packaged_path: Option<PathBuf>,
    /// Absolute location of the zip whenever an asset directory is known,
    /// so the manifest resolves from any assembly directory.
    pub source_path: PathBuf,
}

impl ResolvedAsset {
    pub fn object_key(&self) -> String {
        format!("{}.zip", self.hash)
    }

    /// `Code` property of a Lambda function pointing at the bootstrap bucket.
    pub fn function_code(&self) -> Value {
        json!({
            "S3Bucket": sub(&bucket_name()),
            "S3Key": self.object_key(),
        })
    }

    fn manifest_entry(&self) -> Value {
        json!({
            "source": { "path": self.source_path.display().to_string(), "packaging": "file" },
            "destinations": {
                "current_account-current_region": {
                    "bucketName": bucket_name(),
                    "objectKey": self.object_key(),
                    "assumeRoleArn": format!(
                        "arn:${{AWS::Partition}}:iam::${{AWS::AccountId}}:role/cdk-{BOOTSTRAP_QUALIFIER}-file-publishing-role-${{AWS::AccountId}}-${{AWS::Region}}"
                    ),
                }
            }
        })
    }
}

pub fn asset_manifest(assets: &[ResolvedAsset]) -> Value {
    let files: serde_json::Map<String, Value> = assets
        .iter()
        .map(|asset| (asset.hash.clone(), asset.manifest_entry()))
        .collect();
    json!({
        "version": ASSET_MANIFEST_VERSION,
        "files": files,
        "dockerImages": {},
    })
}

fn bucket_name() -> String {
    format!("cdk-{BOOTSTRAP_QUALIFIER}-assets-${{AWS::AccountId}}-${{AWS::Region}}")
}

fn absolute_path(path: &Path) -> Result<PathBuf, StackError> {
    let read_error = |source| StackError::AssetRead {
        path: path.to_path_buf(),
        source,
    };
    if path.exists() {
        return fs::canonicalize(path).map_err(read_error);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir().map_err(read_error)?.join(path))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
