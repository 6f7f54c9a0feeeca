pub mod article;
pub mod assemble;
pub mod convert;
pub mod dates;
pub mod device;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod flatten;
pub mod fonts;
pub mod image;
pub mod layout;
pub mod metadata;
pub mod normalize;
pub mod parse;
pub mod pdf;
pub mod pdf_text;
pub mod preprocess;
pub mod readability;
pub mod reading;
pub mod remote;
pub mod sanitize;
pub mod scoring;
pub mod store;

pub use article::{ArticleRecord, sanitize_filename};
pub use assemble::{AssembleOptions, assemble};
pub use convert::{Conversion, Converter, ConverterConfig, ConverterConfigBuilder};
pub use dates::format_publication_date;
pub use device::{DeviceProfile, DeviceProfiles, ImageAlign, Margins, PAPER_PRO, PAPER_PRO_MOVE};
pub use error::{PaperfoldError, Result};
#[doc(hidden)]
pub use extract::{ExtractConfig, ExtractedContent, extract_content};
pub use fetch::{FetchConfig, RetryPolicy};
pub use fetch::{extract_shared_url, fetch_bytes, fetch_file, fetch_html, fetch_stdin};
pub use flatten::{FlowItem, StyledRun, flatten};
pub use crate::image::{EmbeddedImage, apply_color_correction, prepare_feature_image, transcode_if_webp};
pub use layout::{DrawOp, Page, PageSet, RenderCursor, render_article, render_index_page};
pub use metadata::Metadata;
pub use normalize::{ExtractionMode, Normalizer, Source};
pub use parse::Document;
pub use pdf_text::extract_pdf_text;
#[doc(hidden)]
pub use preprocess::{PreprocessConfig, preprocess_html};
pub use readability::{Readability, ReadabilityConfig, ReadabilityConfigBuilder};
pub use reading::render_reading_view;
pub use remote::{RemoteConfig, RemoteExtractor};
pub use sanitize::sanitize_fragment;
#[doc(hidden)]
pub use scoring::{ScoreConfig, ScoreResult, score_element};
pub use store::{HistoryEntry, StateStore};
