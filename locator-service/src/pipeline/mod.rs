use std::{pin::Pin, sync::Arc};

use futures::{Stream, StreamExt, TryStreamExt};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// Where the payload came from, e.g. `brojila.csv:17`.
    pub origin: String,
}

impl<T> Envelope<T> {
    pub fn new(payload: T, origin: String) -> Self {
        Self { payload, origin }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

/// A load pipeline: one source, a chain of same-type transforms, and the
/// collected payloads at the end. The first error aborts the whole load.
pub struct Pipeline<S, T> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T, T> + Send + Sync>>, // same-type transforms chain
}

impl<T, S> Pipeline<S, T>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            transforms: Vec::new(),
        }
    }

    pub fn with_transform(mut self, t: Arc<dyn Transform<T, T> + Send + Sync>) -> Self {
        self.transforms.push(t);
        self
    }

    pub async fn collect(self) -> Result<Vec<T>, PipelineError> {
        let mut stream = self.source.stream().await;

        // Apply transforms in sequence (if any).
        for t in self.transforms {
            let t_arc = t.clone();
            stream = Box::pin(stream.then(move |item| {
                let t_inner = t_arc.clone();
                async move {
                    match item {
                        Ok(env) => t_inner.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        stream.map_ok(|env| env.payload).try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Numbers(Vec<i64>);

    #[async_trait::async_trait]
    impl Source<i64> for Numbers {
        async fn stream(&self) -> EnvelopeStream<i64> {
            let items: Vec<_> = self
                .0
                .iter()
                .enumerate()
                .map(|(i, n)| Ok(Envelope::new(*n, format!("numbers:{i}"))))
                .collect();
            Box::pin(futures::stream::iter(items))
        }
    }

    struct RejectNegative;

    #[async_trait::async_trait]
    impl Transform<i64, i64> for RejectNegative {
        async fn apply(&self, input: Envelope<i64>) -> Result<Envelope<i64>, PipelineError> {
            if input.payload < 0 {
                return Err(PipelineError::Transform(format!("{}: negative", input.origin)));
            }
            Ok(input)
        }
    }

    #[tokio::test]
    async fn collects_payloads_in_order() {
        let out = Pipeline::<_, i64>::new(Numbers(vec![3, 1, 2]))
            .with_transform(Arc::new(RejectNegative))
            .collect()
            .await
            .unwrap();
        assert_eq!(out, [3, 1, 2]);
    }

    #[tokio::test]
    async fn first_error_aborts() {
        let err = Pipeline::<_, i64>::new(Numbers(vec![3, -1, 2]))
            .with_transform(Arc::new(RejectNegative))
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Transform(msg) if msg == "numbers:1: negative"));
    }
}
