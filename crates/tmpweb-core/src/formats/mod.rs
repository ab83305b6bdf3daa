//! Upload format handlers.

pub mod common;
pub mod detect;
pub mod html;
pub mod tar;
pub mod traits;
pub mod zip;

pub use detect::ArchiveKind;
pub use detect::resolve_kind;
pub use detect::sniff;
pub use html::HtmlPage;
pub use tar::TarArchive;
pub use traits::ArchiveFormat;
pub use zip::ZipArchive;

/// Returns the handler for `kind` over `data`.
#[must_use]
pub fn handler_for(kind: ArchiveKind, data: &[u8]) -> Box<dyn ArchiveFormat + '_> {
    match kind {
        ArchiveKind::Zip => Box::new(ZipArchive::new(data)),
        ArchiveKind::Tar => Box::new(TarArchive::new(data)),
        ArchiveKind::Html => Box::new(HtmlPage::new(data)),
    }
}
