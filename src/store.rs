//! Model persistence.
//!
//! A fitted pipeline and forest are stored together in one file:
//!
//! ```text
//! offset  size  content
//! 0       8     magic "HOUSEPRD"
//! 8       4     format version, u32 little-endian
//! 12      ..    payload (pipeline parameters, forest), encoded by crate::serialization
//! ```
//!
//! Parameters are stored as exact `f64` bit patterns, so a loaded artifact
//! reproduces the saved model's outputs bit-for-bit.

use crate::error::{HousingError, Result};
use crate::model::{FittedRandomForest, FittedRegressor};
use crate::preprocessing::{FittedPipeline, FittedTransformer, PipelineParams};
use crate::serialization::SerializableParams;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// File signature of a persisted model.
pub const ARTIFACT_MAGIC: &[u8; 8] = b"HOUSEPRD";

/// Newest format version this build reads and the one it writes.
pub const ARTIFACT_VERSION: u32 = 1;

const HEADER_LEN: usize = 12;

#[derive(Serialize, Deserialize)]
struct Payload {
    pipeline: PipelineParams,
    forest: FittedRandomForest,
}

/// A fitted pipeline and the forest trained on its output.
#[derive(Clone, Debug)]
pub struct ModelArtifact {
    pub pipeline: FittedPipeline,
    pub forest: FittedRandomForest,
}

impl ModelArtifact {
    /// Pair a pipeline with a forest, checking that their widths agree.
    pub fn new(pipeline: FittedPipeline, forest: FittedRandomForest) -> Result<Self> {
        if pipeline.n_features_in() != forest.n_features_in() {
            return Err(HousingError::shape(
                format!("{} forest features", pipeline.n_features_in()),
                format!("{} forest features", forest.n_features_in()),
            ));
        }
        Ok(Self { pipeline, forest })
    }

    /// Encode header and payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(ARTIFACT_MAGIC)?;
        writer.write_all(&ARTIFACT_VERSION.to_le_bytes())?;
        let payload = Payload {
            pipeline: self.pipeline.extract_params(),
            forest: self.forest.clone(),
        };
        writer.write_all(&payload.to_bytes()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Decode an artifact, validating header and contents.
    ///
    /// # Errors
    /// - `CorruptArtifact` for a short buffer, wrong magic, version 0, an undecodable
    ///   payload, trailing bytes or non-finite parameters
    /// - `VersionMismatch` for a version newer than [`ARTIFACT_VERSION`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(HousingError::CorruptArtifact(format!(
                "{} bytes is shorter than the artifact header",
                bytes.len()
            )));
        }
        if &bytes[..8] != ARTIFACT_MAGIC {
            return Err(HousingError::CorruptArtifact(
                "missing HOUSEPRD signature".to_string(),
            ));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[8..HEADER_LEN]);
        let version = u32::from_le_bytes(version);
        if version > ARTIFACT_VERSION {
            return Err(HousingError::VersionMismatch {
                found: version,
                supported: ARTIFACT_VERSION,
            });
        }
        if version == 0 {
            return Err(HousingError::CorruptArtifact(
                "format version 0 is not valid".to_string(),
            ));
        }

        let payload = Payload::from_bytes(&bytes[HEADER_LEN..])?;
        payload.forest.check_structure()?;
        let pipeline = FittedPipeline::from_params(payload.pipeline)?;
        Self::new(pipeline, payload.forest).map_err(|e| HousingError::CorruptArtifact(e.to_string()))
    }

    /// Write the artifact to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        info!(path = %path.display(), trees = self.forest.n_trees(), "saved model artifact");
        Ok(())
    }

    /// Read an artifact from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let artifact = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            trees = artifact.forest.n_trees(),
            features = artifact.pipeline.n_features_in(),
            "loaded model artifact"
        );
        Ok(artifact)
    }
}

/// Persist a fitted pipeline and forest as one artifact.
pub fn save<P: AsRef<Path>>(
    pipeline: &FittedPipeline,
    forest: &FittedRandomForest,
    path: P,
) -> Result<()> {
    ModelArtifact::new(pipeline.clone(), forest.clone())?.save(path)
}

/// Load a fitted pipeline and forest saved with [`save`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<(FittedPipeline, FittedRandomForest)> {
    let artifact = ModelArtifact::load(path)?;
    Ok((artifact.pipeline, artifact.forest))
}
