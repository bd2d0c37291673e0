//! Consensus and arbitration domain
//!
//! Compares independently obtained answers to the same question and settles
//! them, with an arbitrator breaking disagreements.
//!
//! - [`AnswerType`] — normalization of raw answers (boolean, date, number, text)
//! - [`agreement`](agreement::agreement) — continuous agreement in `[0, 1]`
//! - [`resolve`] — pure assess / verdict / fallback steps
//! - [`ResolutionPhase`] — `Pending → {Consensus | Arbitrating} → Resolved`
//!
//! Arbitration failures never surface as errors; they downgrade the
//! decision to a penalized fallback.

pub mod agreement;
pub mod answer;
pub mod answer_type;
pub mod decision;
pub mod error;
pub mod parsing;
pub mod policy;
pub mod resolve;
pub mod verdict;

pub use agreement::{mean_pairwise_agreement, most_agreed};
pub use answer::ModelAnswer;
pub use answer_type::AnswerType;
pub use decision::{ConsensusDecision, ResolutionPhase, SelectedSource};
pub use error::ArbitrationError;
pub use parsing::{ParsedReply, parse_answer_reply, parse_verdict};
pub use policy::ConsensusPolicy;
pub use resolve::{Assessment, apply_verdict, arbitration_fallback, assess};
pub use verdict::{ArbitrationChoice, ArbitrationRequest, ArbitrationVerdict};
