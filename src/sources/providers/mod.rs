//! Concrete source adapter implementations.

mod google_books;
mod mercado_editorial;
mod open_library;

pub use google_books::GoogleBooksAdapter;
pub use mercado_editorial::MercadoEditorialAdapter;
pub use open_library::OpenLibraryAdapter;
