use std::fmt;
use std::sync::Arc;

use super::interface::TranslationModel;

/// How a language pair gets translated: one model, or two hops through the
/// pivot language.
///
/// Generic over the model representation so the same shape serves the
/// catalog plan (`TranslationPath<String>`) and the loaded route
/// (`TranslationPath<ModelHandle>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationPath<M> {
    Direct(M),
    Pivot(M, M),
}

impl<M> TranslationPath<M> {
    pub fn as_ref(&self) -> TranslationPath<&M> {
        match self {
            TranslationPath::Direct(m) => TranslationPath::Direct(m),
            TranslationPath::Pivot(to_pivot, from_pivot) => TranslationPath::Pivot(to_pivot, from_pivot),
        }
    }

    pub fn map<N>(self, mut f: impl FnMut(M) -> N) -> TranslationPath<N> {
        match self {
            TranslationPath::Direct(m) => TranslationPath::Direct(f(m)),
            TranslationPath::Pivot(to_pivot, from_pivot) => {
                let to_pivot = f(to_pivot);
                TranslationPath::Pivot(to_pivot, f(from_pivot))
            }
        }
    }

    /// Models in invocation order.
    pub fn hops(&self) -> Vec<&M> {
        match self {
            TranslationPath::Direct(m) => vec![m],
            TranslationPath::Pivot(to_pivot, from_pivot) => vec![to_pivot, from_pivot],
        }
    }

    pub fn is_pivot(&self) -> bool {
        matches!(self, TranslationPath::Pivot(..))
    }
}

/// A loaded model together with the catalog id it was loaded from.
/// Handles compare by id.
#[derive(Clone)]
pub struct ModelHandle {
    id: String,
    model: Arc<dyn TranslationModel>,
}

impl ModelHandle {
    pub fn new(id: impl Into<String>, model: Arc<dyn TranslationModel>) -> Self {
        Self {
            id: id.into(),
            model,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn translate(&self, text: &str) -> anyhow::Result<String> {
        self.model.translate(text).await
    }
}

impl PartialEq for ModelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelHandle {}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelHandle").field(&self.id).finish()
    }
}

impl TranslationPath<ModelHandle> {
    pub fn model_ids(&self) -> TranslationPath<&str> {
        self.as_ref().map(|m| m.id())
    }

    /// Run one chunk through the path.
    ///
    /// The pivot's second hop consumes the first hop's output for this same
    /// chunk; the intermediate text is never re-chunked, even if translation
    /// made it longer than the chunk limit.
    pub async fn apply(&self, chunk: &str) -> anyhow::Result<String> {
        match self {
            TranslationPath::Direct(model) => model.translate(chunk).await,
            TranslationPath::Pivot(to_pivot, from_pivot) => {
                let intermediate = to_pivot.translate(chunk).await?;
                from_pivot.translate(&intermediate).await
            }
        }
    }
}
