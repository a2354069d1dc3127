//! Descriptor registry built by driving an external protoc.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use prost_reflect::{DescriptorPool, MessageDescriptor};
use prost_types::FileDescriptorSet;

use crate::RegistryError;

const PROTO_EXT: &str = "proto";

/// Message descriptors for every `.proto` file under a source root,
/// compiled once at startup. Cheap to clone and safe to share.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pool: DescriptorPool,
}

impl Registry {
    /// Compile the `.proto` tree under `dir` with `protoc` and register all
    /// descriptors. An empty `dir` produces an empty registry, usable for
    /// queries that carry no message macros. `mute` discards the compiler's
    /// stderr instead of passing it through.
    pub fn new(protoc: &str, dir: &str, mute: bool) -> Result<Self, RegistryError> {
        if dir.is_empty() {
            return Ok(Self::default());
        }
        let files = proto_files(dir)?;
        if files.is_empty() {
            return Err(RegistryError::NoProtoFiles(dir.to_string()));
        }
        let bytes = compile(protoc, dir, &files, mute)?;
        let pool = DescriptorPool::decode(bytes.as_slice())?;
        Ok(Self { pool })
    }

    /// Build a registry straight from an already-compiled descriptor set.
    pub fn from_file_descriptor_set(fds: FileDescriptorSet) -> Result<Self, RegistryError> {
        let pool = DescriptorPool::from_file_descriptor_set(fds)?;
        Ok(Self { pool })
    }

    /// Look up a message descriptor by fully-qualified name.
    pub fn find_message(&self, full_name: &str) -> Result<MessageDescriptor, RegistryError> {
        self.pool
            .get_message_by_name(full_name)
            .ok_or_else(|| RegistryError::MessageNotFound(full_name.to_string()))
    }
}

fn proto_files(dir: &str) -> Result<Vec<PathBuf>, RegistryError> {
    let mut res = Vec::new();
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == PROTO_EXT)
        {
            res.push(entry.path().to_path_buf());
        }
    }
    Ok(res)
}

/// Run `protoc -I <dir> --descriptor_set_out <tmp> <files...>` and return
/// the raw `FileDescriptorSet` bytes.
fn compile(
    protoc: &str,
    dir: &str,
    files: &[PathBuf],
    mute: bool,
) -> Result<Vec<u8>, RegistryError> {
    let out = tempfile::NamedTempFile::new()?;
    let mut cmd = Command::new(protoc);
    cmd.arg("-I")
        .arg(dir)
        .arg("--descriptor_set_out")
        .arg(out.path())
        .args(files)
        .stderr(if mute {
            Stdio::null()
        } else {
            Stdio::inherit()
        });
    tracing::debug!(protoc, dir, files = files.len(), "compiling proto sources");
    let status = cmd.status().map_err(|source| RegistryError::Spawn {
        protoc: protoc.to_string(),
        source,
    })?;
    if !status.success() {
        return Err(RegistryError::Compiler(status));
    }
    Ok(fs::read(out.path())?)
}
