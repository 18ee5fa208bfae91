#![forbid(unsafe_code)]

pub mod app_services;
pub mod backup_service;
pub mod commands;
pub mod display;
pub mod error;
pub mod library_service;
pub mod ordering;
pub mod sample;
pub mod sessions;
pub mod settings_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use backup_service::{BACKUP_VERSION, BackupService};
pub use commands::QuizCommands;
pub use display::{DisplaySurface, RecordingDisplay, RenderEvent};
pub use error::{
    AppServicesError, BackupError, CommandError, LibraryError, SessionError,
    SettingsServiceError,
};
pub use library_service::{FileSummary, LibraryService, LibraryStats};
pub use ordering::{KeepOrder, QuestionOrder, ShuffleOptions, ShuffleQuestions, ordering_for};
pub use sample::{SAMPLE_QUIZ_NAME, sample_quiz};
pub use sessions::{AdvanceOutcome, SessionEngine, SessionProgress, SessionState, SubmitFeedback};
pub use settings_service::SettingsService;
