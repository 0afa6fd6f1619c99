//! Error codes for the Scriptorium API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! Every code is SCREAMING_SNAKE_CASE and maps 1:1 to the `code` field of
//! problem-details responses.

use core::fmt;

/// Centralized error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    Unauthorized,
    UnauthorizedMissingBearer,
    UnauthorizedInvalidJwt,
    UnauthorizedExpiredJwt,
    Forbidden,
    ForbiddenUserNotFound,
    /// Caller is not a member of the campaign
    NotAMember,
    /// Operation requires the game master role
    NotGm,
    /// Caller may not act for this character
    NotCharacterOwner,
    NotPostOwner,
    NotLockOwner,

    // Request Validation
    InvalidCampaignId,
    InvalidPathParam,
    InvalidModifier,
    InvalidDiceCount,
    InvalidDiceType,
    InvalidIntention,
    InvalidWitnesses,
    InvalidPassState,
    InvalidPost,
    InvalidReason,
    CharacterNotInScene,
    ValidationError,
    BadRequest,

    // Resource Not Found
    CampaignNotFound,
    SceneNotFound,
    CharacterNotFound,
    PostNotFound,
    RollNotFound,
    LockNotFound,
    UserNotFound,
    NotFound,

    // State conflicts
    LockAlreadyHeld,
    AlreadyInPhase,
    PostLocked,
    RollAlreadyResolved,
    RollInvalidated,
    CannotPassPendingRolls,
    PhaseMismatch,
    CharacterAlreadyInScene,
    AlreadyPaused,
    NotPaused,
    OptimisticLock,
    UniqueViolation,
    Conflict,

    // Phase guards
    ActiveComposeLocks,
    PendingRolls,
    NotAllPassed,
    CampaignPaused,

    // System
    Internal,
    DbError,
    DbUnavailable,
    DataCorruption,
    ConfigError,
}

impl ErrorCode {
    /// Every code, for exhaustive checks in tests.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::Unauthorized,
        ErrorCode::UnauthorizedMissingBearer,
        ErrorCode::UnauthorizedInvalidJwt,
        ErrorCode::UnauthorizedExpiredJwt,
        ErrorCode::Forbidden,
        ErrorCode::ForbiddenUserNotFound,
        ErrorCode::NotAMember,
        ErrorCode::NotGm,
        ErrorCode::NotCharacterOwner,
        ErrorCode::NotPostOwner,
        ErrorCode::NotLockOwner,
        ErrorCode::InvalidCampaignId,
        ErrorCode::InvalidPathParam,
        ErrorCode::InvalidModifier,
        ErrorCode::InvalidDiceCount,
        ErrorCode::InvalidDiceType,
        ErrorCode::InvalidIntention,
        ErrorCode::InvalidWitnesses,
        ErrorCode::InvalidPassState,
        ErrorCode::InvalidPost,
        ErrorCode::InvalidReason,
        ErrorCode::CharacterNotInScene,
        ErrorCode::ValidationError,
        ErrorCode::BadRequest,
        ErrorCode::CampaignNotFound,
        ErrorCode::SceneNotFound,
        ErrorCode::CharacterNotFound,
        ErrorCode::PostNotFound,
        ErrorCode::RollNotFound,
        ErrorCode::LockNotFound,
        ErrorCode::UserNotFound,
        ErrorCode::NotFound,
        ErrorCode::LockAlreadyHeld,
        ErrorCode::AlreadyInPhase,
        ErrorCode::PostLocked,
        ErrorCode::RollAlreadyResolved,
        ErrorCode::RollInvalidated,
        ErrorCode::CannotPassPendingRolls,
        ErrorCode::PhaseMismatch,
        ErrorCode::CharacterAlreadyInScene,
        ErrorCode::AlreadyPaused,
        ErrorCode::NotPaused,
        ErrorCode::OptimisticLock,
        ErrorCode::UniqueViolation,
        ErrorCode::Conflict,
        ErrorCode::ActiveComposeLocks,
        ErrorCode::PendingRolls,
        ErrorCode::NotAllPassed,
        ErrorCode::CampaignPaused,
        ErrorCode::Internal,
        ErrorCode::DbError,
        ErrorCode::DbUnavailable,
        ErrorCode::DataCorruption,
        ErrorCode::ConfigError,
    ];

    /// Canonical wire string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            Self::UnauthorizedInvalidJwt => "UNAUTHORIZED_INVALID_JWT",
            Self::UnauthorizedExpiredJwt => "UNAUTHORIZED_EXPIRED_JWT",
            Self::Forbidden => "FORBIDDEN",
            Self::ForbiddenUserNotFound => "FORBIDDEN_USER_NOT_FOUND",
            Self::NotAMember => "NOT_A_MEMBER",
            Self::NotGm => "NOT_GM",
            Self::NotCharacterOwner => "NOT_CHARACTER_OWNER",
            Self::NotPostOwner => "NOT_POST_OWNER",
            Self::NotLockOwner => "NOT_LOCK_OWNER",
            Self::InvalidCampaignId => "INVALID_CAMPAIGN_ID",
            Self::InvalidPathParam => "INVALID_PATH_PARAM",
            Self::InvalidModifier => "INVALID_MODIFIER",
            Self::InvalidDiceCount => "INVALID_DICE_COUNT",
            Self::InvalidDiceType => "INVALID_DICE_TYPE",
            Self::InvalidIntention => "INVALID_INTENTION",
            Self::InvalidWitnesses => "INVALID_WITNESSES",
            Self::InvalidPassState => "INVALID_PASS_STATE",
            Self::InvalidPost => "INVALID_POST",
            Self::InvalidReason => "INVALID_REASON",
            Self::CharacterNotInScene => "CHARACTER_NOT_IN_SCENE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::CampaignNotFound => "CAMPAIGN_NOT_FOUND",
            Self::SceneNotFound => "SCENE_NOT_FOUND",
            Self::CharacterNotFound => "CHARACTER_NOT_FOUND",
            Self::PostNotFound => "POST_NOT_FOUND",
            Self::RollNotFound => "ROLL_NOT_FOUND",
            Self::LockNotFound => "LOCK_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::LockAlreadyHeld => "LOCK_ALREADY_HELD",
            Self::AlreadyInPhase => "ALREADY_IN_PHASE",
            Self::PostLocked => "POST_LOCKED",
            Self::RollAlreadyResolved => "ROLL_ALREADY_RESOLVED",
            Self::RollInvalidated => "ROLL_INVALIDATED",
            Self::CannotPassPendingRolls => "CANNOT_PASS_PENDING_ROLLS",
            Self::PhaseMismatch => "PHASE_MISMATCH",
            Self::CharacterAlreadyInScene => "CHARACTER_ALREADY_IN_SCENE",
            Self::AlreadyPaused => "ALREADY_PAUSED",
            Self::NotPaused => "NOT_PAUSED",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::UniqueViolation => "UNIQUE_VIOLATION",
            Self::Conflict => "CONFLICT",
            Self::ActiveComposeLocks => "ACTIVE_COMPOSE_LOCKS",
            Self::PendingRolls => "PENDING_ROLLS",
            Self::NotAllPassed => "NOT_ALL_PASSED",
            Self::CampaignPaused => "CAMPAIGN_PAUSED",
            Self::Internal => "INTERNAL",
            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
