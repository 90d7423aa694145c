pub mod composer;
pub mod dialogs;
pub mod sidebar;
pub mod transcript;

pub use composer::Composer;
pub use dialogs::{ConfirmDialog, ConfirmRequest, NoticeBanner};
pub use sidebar::ChatSidebar;
pub use transcript::Transcript;
