pub mod auth;
pub mod conversation;
pub mod pdf;
pub mod prediction;

pub use auth::AuthService;
pub use conversation::ConversationService;
pub use pdf::PdfService;
pub use prediction::{PredictionInput, PredictionOutput, PredictionService};
