use std::path::PathBuf;

use async_stream::try_stream;
use grid_client::domain::{Feature, FeatureCollection};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Streams the features of a GeoJSON `FeatureCollection` file.
///
/// The whole file is parsed before the first feature is yielded, so a
/// malformed document fails the load without producing partial output.
pub struct GeoJsonFileSource {
    path: PathBuf,
}

impl GeoJsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Source<Feature> for GeoJsonFileSource {
    async fn stream(&self) -> EnvelopeStream<Feature> {
        let path = self.path.clone();
        let s = try_stream! {
            let bytes = tokio::fs::read(&path).await.map_err(|e| {
                PipelineError::Source(format!("failed to open {}: {e}", path.display()))
            })?;
            let collection: FeatureCollection = match serde_json::from_slice(&bytes) {
                Ok(fc) => fc,
                Err(e) => {
                    metrics::counter!("geojson_parse_errors_total").increment(1);
                    Err(PipelineError::Source(format!(
                        "failed to parse {} as a feature collection: {e}",
                        path.display()
                    )))?
                }
            };
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

            for (i, feature) in collection.features.into_iter().enumerate() {
                yield Envelope::new(feature, format!("{name}#{i}"));
            }
        };

        Box::pin(s)
    }
}
