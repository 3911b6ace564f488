use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::asset::asset_manifest;
use crate::error::StackError;
use crate::stack::{PlaygroundStack, SynthesizedStack};

pub const CLOUD_ASSEMBLY_VERSION: &str = "36.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyPaths {
    pub template: PathBuf,
    pub assets: PathBuf,
    pub manifest: PathBuf,
}

/// Synthesizes `stack` and writes its template, asset manifest, and the
/// assembly manifest into `out_dir`.
pub fn write_cloud_assembly(
    out_dir: &Path,
    stack: &PlaygroundStack,
    asset_dir: Option<&Path>,
) -> Result<AssemblyPaths, StackError> {
    let synthesized = stack.synthesize_with_assets(asset_dir)?;

    fs::create_dir_all(out_dir).map_err(|source| StackError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let paths = AssemblyPaths {
        template: out_dir.join(template_file_name(&synthesized.stack_name)),
        assets: out_dir.join(assets_file_name(&synthesized.stack_name)),
        manifest: out_dir.join("manifest.json"),
    };

    write_json(&paths.template, &synthesized.template, "template")?;
    write_json(
        &paths.assets,
        &asset_manifest(&synthesized.assets),
        "asset manifest",
    )?;
    write_json(
        &paths.manifest,
        &assembly_manifest(&synthesized),
        "assembly manifest",
    )?;

    tracing::info!(
        stack = %synthesized.stack_name,
        environment = %synthesized.environment.assembly_uri(),
        resources = synthesized.template.resources.len(),
        assets = synthesized.assets.len(),
        out_dir = %out_dir.display(),
        "cloud assembly written"
    );

    Ok(paths)
}

pub fn assembly_manifest(synthesized: &SynthesizedStack) -> Value {
    let stack_name = synthesized.stack_name.as_str();
    let assets_artifact = format!("{stack_name}.assets");
    json!({
        "version": CLOUD_ASSEMBLY_VERSION,
        "artifacts": {
            assets_artifact.clone(): {
                "type": "cdk:asset-manifest",
                "properties": { "file": assets_file_name(stack_name) },
            },
            stack_name: {
                "type": "aws:cloudformation:stack",
                "environment": synthesized.environment.assembly_uri(),
                "properties": { "templateFile": template_file_name(stack_name) },
                "dependencies": [assets_artifact],
            },
        },
    })
}

fn template_file_name(stack_name: &str) -> String {
    format!("{stack_name}.template.json")
}

fn assets_file_name(stack_name: &str) -> String {
    format!("{stack_name}.assets.json")
}

fn write_json(path: &Path, value: &impl Serialize, artifact: &'static str) -> Result<(), StackError> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|source| StackError::Serialize { artifact, source })?;
    fs::write(path, body).map_err(|source| StackError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;
    use crate::stack::DEV_STACK_NAME;

    #[test]
    fn writes_all_artifacts_into_new_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out_dir = dir.path().join("cdk.out");
        let stack = PlaygroundStack::new(
            DEV_STACK_NAME,
            Environment::new(Some("123456789012".to_string()), Some("sa-east-1".to_string())),
        )
        .expect("stack should build");

        let paths = write_cloud_assembly(&out_dir, &stack, None).expect("assembly should write");

        assert_eq!(
            paths.template,
            out_dir.join("dynamodb-playground-dev.template.json")
        );
        let manifest: Value = serde_json::from_str(
            &fs::read_to_string(&paths.manifest).expect("manifest should exist"),
        )
        .expect("manifest should parse");
        let artifact = &manifest["artifacts"]["dynamodb-playground-dev"];
        assert_eq!(artifact["environment"], "aws://123456789012/sa-east-1");
        assert_eq!(
            artifact["dependencies"],
            json!(["dynamodb-playground-dev.assets"])
        );

        let template: Value = serde_json::from_str(
            &fs::read_to_string(&paths.template).expect("template should exist"),
        )
        .expect("template should parse");
        assert_eq!(template["Resources"].as_object().map(|r| r.len()), Some(13));
        assert!(paths.assets.is_file());
    }

    #[test]
    fn asset_sources_resolve_from_assembly_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let asset_dir = dir.path().join("dist").join("lambda");
        fs::create_dir_all(&asset_dir).expect("asset dir");
        for binary in ["insert_lambda", "update_lambda", "delete_lambda"] {
            fs::write(asset_dir.join(format!("{binary}.zip")), binary).expect("write zip");
        }
        let out_dir = dir.path().join("cdk.out");
        let stack =
            PlaygroundStack::new(DEV_STACK_NAME, Environment::default()).expect("stack should build");

        let paths =
            write_cloud_assembly(&out_dir, &stack, Some(&asset_dir)).expect("assembly should write");

        let assets: Value = serde_json::from_str(
            &fs::read_to_string(&paths.assets).expect("asset manifest should exist"),
        )
        .expect("asset manifest should parse");
        let files = assets["files"].as_object().expect("files should be an object");
        assert_eq!(files.len(), 3);
        for entry in files.values() {
            let source = entry["source"]["path"].as_str().expect("source path");
            assert!(
                out_dir.join(source).is_file(),
                "asset {source} should resolve from {}",
                out_dir.display()
            );
        }
    }

    #[test]
    fn invalid_stack_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out_dir = dir.path().join("cdk.out");
        let mut stack =
            PlaygroundStack::new(DEV_STACK_NAME, Environment::default()).expect("stack should build");
        stack.table_mut().stream = None;

        let error = write_cloud_assembly(&out_dir, &stack, None).expect_err("should fail");

        assert!(matches!(error, StackError::Validation(_)));
        assert!(!out_dir.exists());
    }
}
