use ddd_domain::error::DomainError;
use ddd_domain::value_object::EntityIdentity;

/// 仓储/工作单元错误
///
/// 策略与存储层返回的 `DomainError` 以 `Domain` 原样透传。
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("no persistence strategy registered for type {entity_type}")]
    StrategyNotFound { entity_type: &'static str },

    #[error("failed to construct persistence strategy {strategy}: {reason}")]
    StrategyConstruction {
        strategy: &'static str,
        reason: String,
    },

    #[error(
        "type {entity_type} is exposed by more than one strategy: existing={existing}, duplicate={duplicate}"
    )]
    DuplicateStrategyAlias {
        entity_type: &'static str,
        existing: &'static str,
        duplicate: &'static str,
    },

    #[error("entity not found: type={entity_type}, id={id}")]
    EntityNotFound {
        entity_type: &'static str,
        id: EntityIdentity,
    },

    #[error("aggregate {aggregate} is in an invalid state: {source}")]
    InvariantViolation {
        aggregate: &'static str,
        #[source]
        source: DomainError,
    },

    #[error("failed to construct event handler {handler} for event {event_type}")]
    HandlerConstruction {
        handler: &'static str,
        event_type: &'static str,
    },

    #[error("event handler {handler} failed for event {event_type}: {source}")]
    HandlerFailure {
        handler: &'static str,
        event_type: &'static str,
        #[source]
        source: DomainError,
    },

    #[error("pending domain events still present after {rounds} drain rounds")]
    DrainLimitExceeded { rounds: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// 统一 Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
