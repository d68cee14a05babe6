//! Data models for Lexreview

pub mod contact;
pub mod enums;
pub mod evaluation;
pub mod journal;
pub mod message;
pub mod paper;
pub mod user;

// Re-export commonly used types
pub use contact::Contact;
pub use enums::{
    EvaluationStatus, FieldOfLaw, JournalStatus, Offer, OfferAccepted, PaperType, Position,
    RankingTier, StartDecision, UserType,
};
pub use evaluation::{Evaluation, JournalSubmission};
pub use journal::{EditorAssignment, Journal, JournalDetails, JournalProfile};
pub use message::Message;
pub use paper::{DocumentSlot, Paper, PaperDetails, PaperSummary};
pub use user::{PersonalProfile, User, UserClaims, UserProfile};
