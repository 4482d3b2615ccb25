pub mod film;
pub mod note;
pub mod review;
pub mod text;

pub use film::FilmRef;
pub use note::Note;
pub use review::{Review, ReviewDraft};
