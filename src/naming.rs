use crate::Uuid;

/// Maps an aggregate type and ID to the stream holding its events.
///
/// Implementations must be pure and deterministic. When several aggregate types share one log,
/// the mapping must also keep their streams apart (see [`TypePrefixedNaming`]).
pub trait StreamNaming: Send + Sync {
    fn stream_id(&self, aggregate_type: &str, id: Uuid) -> String;
}

impl<F> StreamNaming for F
where
    F: Fn(&str, Uuid) -> String + Send + Sync,
{
    fn stream_id(&self, aggregate_type: &str, id: Uuid) -> String {
        self(aggregate_type, id)
    }
}

/// Names a stream after the aggregate ID alone, in its canonical hyphenated form.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdStreamNaming;

impl StreamNaming for IdStreamNaming {
    fn stream_id(&self, _aggregate_type: &str, id: Uuid) -> String {
        id.to_string()
    }
}

/// Names a stream `{aggregate_type}-{id}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypePrefixedNaming;

impl StreamNaming for TypePrefixedNaming {
    fn stream_id(&self, aggregate_type: &str, id: Uuid) -> String {
        format!("{aggregate_type}-{id}")
    }
}
