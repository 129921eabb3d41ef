//! Image comparison.
//!
//! An [`ImageComparator`] holds the thresholds and plugin registries and
//! turns two [`ImageSource`]s into a [`Comparison`]. The comparison knows
//! its [`Verdict`], can print a message for a test report and, for failed
//! comparisons against a file, save the actual image next to other
//! diagnostics.
//!
//! ```
//! use zencompare::{
//!     ImageComparator, PixelDescriptor, PixelFormat, PixelSlice, PixelStorage, Thresholds,
//!     Verdict,
//! };
//!
//! let format = PixelFormat::Color(PixelDescriptor::R8_UNORM);
//! let actual = PixelSlice::new(PixelStorage::packed(), format, 2, 1, &[10, 20]).unwrap();
//! let expected = PixelSlice::new(PixelStorage::packed(), format, 2, 1, &[10, 23]).unwrap();
//!
//! let comparison = ImageComparator::new(Thresholds::new(4.0, 2.0)).compare(&actual, &expected);
//! assert_eq!(comparison.verdict(), Verdict::PassVerbose);
//! assert_eq!(comparison.max(), Some(3.0));
//! ```

use core::fmt::{self, Write};
use core::ops::{BitOr, BitOrAssign};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use imgref::ImgRef;

use crate::buffer::{PixelBuffer, PixelSlice};
use crate::delta::{DeltaField, calculate_delta};
use crate::numfmt::General;
use crate::outliers::{DEFAULT_OUTLIER_LIMIT, OutlierReport};
use crate::output::ImageData;
use crate::pixel::{PixelComponents, PixelView};
use crate::pixel_format::{FormatError, PixelFormat};
use crate::plugins::PluginManager;
use crate::sink::TextSink;
use crate::source::ImageSource;
use crate::thresholds::Thresholds;
use crate::traits::{ConvertError, ImageConverter, ImageImporter, Plugin};
use crate::visualize::render_delta_image;

/// Name of the importer used for file sources.
pub const IMPORTER_PLUGIN: &str = "AnyImageImporter";

/// Name of the converter used for saving diagnostics.
pub const CONVERTER_PLUGIN: &str = "AnyImageConverter";

// ---------------------------------------------------------------------------
// Verdict and status flags
// ---------------------------------------------------------------------------

/// Result of a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Identical within zero delta, nothing to report.
    Pass,
    /// Within thresholds, but with a nonzero delta worth printing on
    /// request.
    PassVerbose,
    /// Above a threshold, or not comparable at all.
    Fail,
}

/// Status reported to a test runner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusFlags(u8);

impl StatusFlags {
    /// The comparison failed.
    pub const FAILED: Self = Self(1);
    /// A message is available for verbose output.
    pub const VERBOSE: Self = Self(1 << 1);
    /// A diagnostic image can be saved.
    pub const DIAGNOSTIC: Self = Self(1 << 2);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Whether no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether all flags in `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StatusFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// SaveError
// ---------------------------------------------------------------------------

/// Errors from [`Comparison::save_diagnostic`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SaveError {
    #[error("no diagnostic image available")]
    NothingToSave,
    #[error("{0} plugin could not be loaded")]
    PluginLoadFailed(String),
    #[error("{plugin} can't write {}", .path.display())]
    UnsupportedExtension { plugin: String, path: PathBuf },
    #[error("can't create {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("can't write to the text sink")]
    Sink(#[from] fmt::Error),
}

// ---------------------------------------------------------------------------
// ImageComparator
// ---------------------------------------------------------------------------

/// Compares images against thresholds.
///
/// File sources are opened with the [`IMPORTER_PLUGIN`] of the importer
/// registry and diagnostics are saved with the [`CONVERTER_PLUGIN`] of the
/// converter registry. Without explicit registries the built-in plugins
/// are used.
#[derive(Clone, Copy, Debug)]
pub struct ImageComparator<'r> {
    thresholds: Thresholds,
    max_outliers: usize,
    importers: Option<&'r PluginManager<dyn ImageImporter>>,
    converters: Option<&'r PluginManager<dyn ImageConverter>>,
}

impl Default for ImageComparator<'_> {
    fn default() -> Self {
        Self::new(Thresholds::exact())
    }
}

impl<'r> ImageComparator<'r> {
    /// Comparator with the given thresholds and default plugins.
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            max_outliers: DEFAULT_OUTLIER_LIMIT,
            importers: None,
            converters: None,
        }
    }

    /// Set how many outliers a message lists.
    pub fn with_max_outliers(mut self, max_outliers: usize) -> Self {
        self.max_outliers = max_outliers;
        self
    }

    /// Open files through `importers`.
    pub fn with_importers(mut self, importers: &'r PluginManager<dyn ImageImporter>) -> Self {
        self.importers = Some(importers);
        self
    }

    /// Save diagnostics through `converters`.
    pub fn with_converters(mut self, converters: &'r PluginManager<dyn ImageConverter>) -> Self {
        self.converters = Some(converters);
        self
    }

    /// The thresholds.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Compare two in-memory images.
    pub fn compare(&self, actual: &PixelSlice<'_>, expected: &PixelSlice<'_>) -> Comparison<'r> {
        self.compare_sources(ImageSource::Image(*actual), ImageSource::Image(*expected))
    }

    /// Compare two image files.
    pub fn compare_files(&self, actual: &Path, expected: &Path) -> Comparison<'r> {
        self.compare_sources(ImageSource::File(actual), ImageSource::File(expected))
    }

    /// Compare an in-memory image to an image file.
    pub fn compare_to_file(&self, actual: &PixelSlice<'_>, expected: &Path) -> Comparison<'r> {
        self.compare_sources(ImageSource::Image(*actual), ImageSource::File(expected))
    }

    /// Compare an image file to an in-memory image.
    pub fn compare_file_to_image(
        &self,
        actual: &Path,
        expected: &PixelSlice<'_>,
    ) -> Comparison<'r> {
        self.compare_sources(ImageSource::File(actual), ImageSource::Image(*expected))
    }

    /// Compare typed pixels to an in-memory image, taking the format of
    /// `expected` if the pixel type fits it.
    pub fn compare_pixels<P: PixelComponents>(
        &self,
        actual: ImgRef<'_, P>,
        expected: &PixelSlice<'_>,
    ) -> Comparison<'r> {
        self.compare_sources(PixelView::from(actual).into(), ImageSource::Image(*expected))
    }

    /// Compare typed pixels to an image file.
    pub fn compare_pixels_to_file<P: PixelComponents>(
        &self,
        actual: ImgRef<'_, P>,
        expected: &Path,
    ) -> Comparison<'r> {
        self.compare_sources(PixelView::from(actual).into(), ImageSource::File(expected))
    }

    /// Compare any two sources.
    pub fn compare_sources(
        &self,
        actual: ImageSource<'_>,
        expected: ImageSource<'_>,
    ) -> Comparison<'r> {
        let (outcome, diagnostic) = self.evaluate(actual, expected);
        let verdict = match &outcome {
            Outcome::Computed(deltas) => judge(deltas.max, deltas.mean, self.thresholds),
            _ => Verdict::Fail,
        };
        let diagnostic = if verdict == Verdict::Fail {
            diagnostic
        } else {
            None
        };
        log::debug!("{outcome:?} with {:?}: {verdict:?}", self.thresholds);

        Comparison {
            thresholds: self.thresholds,
            outcome,
            verdict,
            diagnostic,
            converters: self.converters,
        }
    }

    fn evaluate(
        &self,
        actual: ImageSource<'_>,
        expected: ImageSource<'_>,
    ) -> (Outcome, Option<Diagnostic>) {
        let defaults;
        let importer = if actual.is_file() || expected.is_file() {
            let importers = match self.importers {
                Some(importers) => importers,
                None => {
                    defaults = PluginManager::<dyn ImageImporter>::with_defaults();
                    &defaults
                }
            };
            match importers.load(IMPORTER_PLUGIN) {
                Some(importer) => Some(importer),
                None => return (Outcome::PluginLoadFailed, None),
            }
        } else {
            None
        };

        let actual_data = match (actual, importer) {
            (ImageSource::File(path), Some(importer)) => match importer.open(path) {
                Ok(data) => Some(data),
                Err(err) => {
                    log::debug!("can't open actual image {}: {err}", path.display());
                    return (Outcome::ActualLoadFailed(path.to_path_buf()), None);
                }
            },
            _ => None,
        };

        let expected_data = match (expected, importer) {
            (ImageSource::File(path), Some(importer)) => match importer.open(path) {
                Ok(data) => Some(data),
                Err(err) => {
                    log::debug!("can't open expected image {}: {err}", path.display());
                    let actual_image = pixels(actual, actual_data.as_ref(), None).ok();
                    return (
                        Outcome::ExpectedLoadFailed(path.to_path_buf()),
                        diagnostic(expected.path(), actual_image),
                    );
                }
            },
            _ => None,
        };

        let expected_image = pixels(expected, expected_data.as_ref(), None);
        let expected_format = expected_image.ok().map(|image| image.format());
        let actual_image = pixels(actual, actual_data.as_ref(), expected_format);
        let (actual_image, expected_image) = match (actual_image, expected_image) {
            (Err(path), _) => return (Outcome::ActualCompressed(path.to_path_buf()), None),
            (Ok(actual_image), Err(path)) => {
                return (
                    Outcome::ExpectedCompressed(path.to_path_buf()),
                    diagnostic(expected.path(), Some(actual_image)),
                );
            }
            (Ok(actual_image), Ok(expected_image)) => (actual_image, expected_image),
        };

        let outcome = if actual_image.size() != expected_image.size() {
            Outcome::DifferentSize {
                actual: actual_image.size(),
                expected: expected_image.size(),
            }
        } else if actual_image.format() != expected_image.format() {
            Outcome::DifferentFormat {
                actual: actual_image.format(),
                expected: expected_image.format(),
            }
        } else {
            match self.deltas(&actual_image, &expected_image) {
                Ok(deltas) => Outcome::Computed(deltas),
                Err(err) => Outcome::UnsupportedFormat(err),
            }
        };
        (outcome, diagnostic(expected.path(), Some(actual_image)))
    }

    fn deltas(
        &self,
        actual: &PixelSlice<'_>,
        expected: &PixelSlice<'_>,
    ) -> Result<Deltas, FormatError> {
        let (field, max, mean) = calculate_delta(actual, expected)?;
        let report =
            OutlierReport::collect(&field, actual, expected, self.thresholds, self.max_outliers)?;
        Ok(Deltas {
            field,
            report,
            max,
            mean,
        })
    }
}

/// Pixels of one side, or the path of a file without plain pixels.
fn pixels<'s>(
    source: ImageSource<'s>,
    data: Option<&'s ImageData>,
    expected: Option<PixelFormat>,
) -> Result<PixelSlice<'s>, &'s Path> {
    match source {
        ImageSource::Image(slice) => Ok(slice),
        ImageSource::Pixels(view) => Ok(match expected {
            Some(format) => view.infer(format),
            None => view.generic(),
        }),
        ImageSource::File(path) => data
            .and_then(ImageData::pixels)
            .map(PixelBuffer::as_slice)
            .ok_or(path),
    }
}

fn diagnostic(expected: Option<&Path>, actual: Option<PixelSlice<'_>>) -> Option<Diagnostic> {
    let file_name = expected?.file_name()?.to_os_string();
    Some(Diagnostic {
        image: PixelBuffer::from_slice(&actual?),
        file_name,
    })
}

fn judge(max: f32, mean: f32, thresholds: Thresholds) -> Verdict {
    // NaN fails both
    let max_failed = !(max <= thresholds.max());
    let mean_failed = !(mean <= thresholds.mean());
    if max_failed || mean_failed {
        Verdict::Fail
    } else if max == 0.0 && mean == 0.0 {
        Verdict::Pass
    } else {
        Verdict::PassVerbose
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Outcome {
    PluginLoadFailed,
    ActualLoadFailed(PathBuf),
    ExpectedLoadFailed(PathBuf),
    ActualCompressed(PathBuf),
    ExpectedCompressed(PathBuf),
    DifferentSize {
        actual: (u32, u32),
        expected: (u32, u32),
    },
    DifferentFormat {
        actual: PixelFormat,
        expected: PixelFormat,
    },
    UnsupportedFormat(FormatError),
    Computed(Deltas),
}

struct Deltas {
    field: DeltaField,
    report: OutlierReport,
    max: f32,
    mean: f32,
}

impl fmt::Debug for Deltas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deltas({}/{})", General::f32(self.max), General::f32(self.mean))
    }
}

/// Copy of the actual image, saved under the name of the expected file.
#[derive(Debug)]
struct Diagnostic {
    image: PixelBuffer,
    file_name: OsString,
}

/// Result of comparing two images.
#[derive(Debug)]
pub struct Comparison<'r> {
    thresholds: Thresholds,
    outcome: Outcome,
    verdict: Verdict,
    diagnostic: Option<Diagnostic>,
    converters: Option<&'r PluginManager<dyn ImageConverter>>,
}

impl Comparison<'_> {
    /// Pass, verbose pass or failure.
    #[inline]
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Whether the images are within thresholds.
    #[inline]
    pub fn passed(&self) -> bool {
        self.verdict != Verdict::Fail
    }

    /// Status for a test runner.
    pub fn flags(&self) -> StatusFlags {
        let mut flags = match self.verdict {
            Verdict::Pass => StatusFlags::empty(),
            Verdict::PassVerbose => StatusFlags::VERBOSE,
            Verdict::Fail => StatusFlags::FAILED,
        };
        if self.diagnostic.is_some() {
            flags |= StatusFlags::DIAGNOSTIC;
        }
        flags
    }

    /// Max delta, if the images could be compared pixel by pixel.
    pub fn max(&self) -> Option<f32> {
        self.deltas().map(|deltas| deltas.max)
    }

    /// Mean delta, if the images could be compared pixel by pixel.
    pub fn mean(&self) -> Option<f32> {
        self.deltas().map(|deltas| deltas.mean)
    }

    /// Per-pixel deltas.
    pub fn delta_field(&self) -> Option<&DeltaField> {
        self.deltas().map(|deltas| &deltas.field)
    }

    /// Pixels above the outlier cutoff.
    pub fn outliers(&self) -> Option<&OutlierReport> {
        self.deltas().map(|deltas| &deltas.report)
    }

    fn deltas(&self) -> Option<&Deltas> {
        match &self.outcome {
            Outcome::Computed(deltas) => Some(deltas),
            _ => None,
        }
    }

    /// The message without colors, with the images labeled `actual` and
    /// `expected`. Empty for [`Verdict::Pass`].
    pub fn message(&self, actual: &str, expected: &str) -> String {
        Message {
            comparison: self,
            actual,
            expected,
        }
        .to_string()
    }

    /// Write the message into `sink`, ending with a newline. Writes
    /// nothing for [`Verdict::Pass`].
    pub fn print_message(
        &self,
        sink: &mut TextSink<'_>,
        actual: &str,
        expected: &str,
    ) -> fmt::Result {
        match &self.outcome {
            Outcome::PluginLoadFailed => {
                writeln!(sink, "{IMPORTER_PLUGIN} plugin could not be loaded.")
            }
            Outcome::ActualLoadFailed(path) => writeln!(
                sink,
                "Actual image {actual} ({}) could not be loaded.",
                path.display()
            ),
            Outcome::ExpectedLoadFailed(path) => writeln!(
                sink,
                "Expected image {expected} ({}) could not be loaded.",
                path.display()
            ),
            Outcome::ActualCompressed(path) => writeln!(
                sink,
                "Actual image {actual} ({}) is compressed, comparison not possible.",
                path.display()
            ),
            Outcome::ExpectedCompressed(path) => writeln!(
                sink,
                "Expected image {expected} ({}) is compressed, comparison not possible.",
                path.display()
            ),
            Outcome::DifferentSize {
                actual: (actual_width, actual_height),
                expected: (expected_width, expected_height),
            } => writeln!(
                sink,
                "Images {actual} and {expected} have different size, actual \
                 Vector({actual_width}, {actual_height}) but \
                 Vector({expected_width}, {expected_height}) expected."
            ),
            Outcome::DifferentFormat {
                actual: actual_format,
                expected: expected_format,
            } => writeln!(
                sink,
                "Images {actual} and {expected} have different format, actual \
                 {actual_format} but {expected_format} expected."
            ),
            Outcome::UnsupportedFormat(err) => {
                writeln!(sink, "Images {actual} and {expected} can't be compared: {err}.")
            }
            Outcome::Computed(deltas) => self.print_deltas(sink, deltas, actual, expected),
        }
    }

    fn print_deltas(
        &self,
        sink: &mut TextSink<'_>,
        deltas: &Deltas,
        actual: &str,
        expected: &str,
    ) -> fmt::Result {
        if self.verdict == Verdict::Pass {
            return Ok(());
        }

        let thresholds = self.thresholds;
        let max = General::f32(deltas.max);
        let mean = General::f32(deltas.mean);
        let max_threshold = General::f32(thresholds.max());
        let mean_threshold = General::f32(thresholds.mean());
        let max_failed = !(deltas.max <= thresholds.max());
        let mean_failed = !(deltas.mean <= thresholds.mean());

        write!(sink, "Images {actual} and {expected} have ")?;
        match (max_failed, mean_failed) {
            (true, true) => write!(
                sink,
                "both max and mean delta above threshold, actual {max}/{mean} but at most \
                 {max_threshold}/{mean_threshold} expected."
            )?,
            (true, false) => write!(
                sink,
                "max delta above threshold, actual {max} but at most {max_threshold} expected. \
                 Mean delta {mean} is within threshold {mean_threshold}."
            )?,
            (false, true) => write!(
                sink,
                "mean delta above threshold, actual {mean} but at most {mean_threshold} \
                 expected. Max delta {max} is within threshold {max_threshold}."
            )?,
            (false, false) => write!(
                sink,
                "deltas {max}/{mean} below threshold {max_threshold}/{mean_threshold}."
            )?,
        }

        sink.write_str(" Delta image:\n")?;
        render_delta_image(
            sink,
            &deltas.field,
            deltas.max,
            thresholds.max(),
            thresholds.mean(),
        )?;
        if !deltas.report.is_empty() {
            sink.write_char('\n')?;
            deltas.report.write(sink, thresholds)?;
        }
        sink.write_char('\n')
    }

    /// Save the actual image into `dir`, named after the expected file.
    ///
    /// Available when [`flags`](Self::flags) contains
    /// [`StatusFlags::DIAGNOSTIC`]. Creates `dir` if needed and writes
    /// `-> <path>` into `sink` on success. The verdict is not affected
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns a [`SaveError`] if there is no diagnostic image, the
    /// converter plugin is missing, or the image can't be written.
    pub fn save_diagnostic(
        &self,
        sink: &mut TextSink<'_>,
        dir: &Path,
    ) -> Result<PathBuf, SaveError> {
        self.try_save(sink, dir)
            .inspect(|path| log::info!("saved diagnostic image to {}", path.display()))
            .inspect_err(|err| log::warn!("can't save diagnostic image: {err}"))
    }

    fn try_save(&self, sink: &mut TextSink<'_>, dir: &Path) -> Result<PathBuf, SaveError> {
        let diagnostic = self.diagnostic.as_ref().ok_or(SaveError::NothingToSave)?;

        let defaults;
        let converters = match self.converters {
            Some(converters) => converters,
            None => {
                defaults = PluginManager::<dyn ImageConverter>::with_defaults();
                &defaults
            }
        };
        let converter = converters
            .load(CONVERTER_PLUGIN)
            .ok_or_else(|| SaveError::PluginLoadFailed(CONVERTER_PLUGIN.to_string()))?;

        let path = dir.join(&diagnostic.file_name);
        if !writes_extension(converter, &path) {
            return Err(SaveError::UnsupportedExtension {
                plugin: converter.name().to_string(),
                path,
            });
        }

        fs::create_dir_all(dir).map_err(|source| SaveError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        converter.convert_to_file(&diagnostic.image.as_slice(), &path)?;
        writeln!(sink, "-> {}", path.display())?;
        Ok(path)
    }
}

struct Message<'c, 'r> {
    comparison: &'c Comparison<'r>,
    actual: &'c str,
    expected: &'c str,
}

impl fmt::Display for Message<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.comparison
            .print_message(&mut TextSink::new(f), self.actual, self.expected)
    }
}

fn writes_extension(converter: &dyn ImageConverter, path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            converter
                .extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{PixelDescriptor, PixelStorage};
    use crate::builtin::AnyImageConverter;
    use crate::format::dds_header;
    use crate::test_data::*;
    use imgref::Img;
    use pretty_assertions::assert_eq;
    use rgb::{Rgb, Rgba};

    const RGB_ERROR: &str = "Images a and b have both max and mean delta above threshold, \
         actual 39/18.5 but at most 20/10 expected. Delta image:\n          |?M|\n        \
         Pixels above max/mean threshold:\n          \
         [1,1] #abcd85, expected #abcdfa (Δ = 39)\n          \
         [1,0] #5647ec, expected #5610ed (Δ = 18.6667)\n          \
         [0,1] #235710, expected #232710 (Δ = 16)\n";

    const RGB_VERBOSE: &str = "Images a and b have deltas 39/18.5 below threshold 40/20. \
         Delta image:\n          |?M|\n        \
         Pixels above max/mean threshold:\n          \
         [1,1] #abcd85, expected #abcdfa (Δ = 39)\n";

    fn comparator<'r>(max: f32, mean: f32) -> ImageComparator<'r> {
        ImageComparator::new(Thresholds::new(max, mean))
    }

    fn actual_rgb_pixels() -> Img<Vec<Rgb<u8>>> {
        Img::new(
            vec![
                Rgb::new(0x56, 0xf8, 0x3a),
                Rgb::new(0x56, 0x47, 0xec),
                Rgb::new(0x23, 0x57, 0x10),
                Rgb::new(0xab, 0xcd, 0x85),
            ],
            2,
            2,
        )
    }

    /// Actual and expected RGB fixtures written as TGA files.
    fn rgb_files(dir: &Path) -> (PathBuf, PathBuf) {
        let actual = dir.join("CompareImageActual.tga");
        let expected = dir.join("CompareImageExpected.tga");
        AnyImageConverter.convert_to_file(&actual_rgb(), &actual).unwrap();
        AnyImageConverter.convert_to_file(&expected_rgb(), &expected).unwrap();
        (actual, expected)
    }

    fn compressed_file(dir: &Path) -> PathBuf {
        let path = dir.join("CompareImageCompressed.dds");
        fs::write(&path, dds_header(2, 2, Some(b"DXT1"))).unwrap();
        path
    }

    // -- In-memory images ---------------------------------------------------

    #[test]
    fn zero_delta() {
        let comparison = comparator(40.0, 20.0).compare(&expected_rgb(), &expected_rgb());
        assert_eq!(comparison.verdict(), Verdict::Pass);
        assert!(comparison.flags().is_empty());
        assert_eq!(comparison.max(), Some(0.0));
        assert_eq!(comparison.message("a", "b"), "");
    }

    #[test]
    fn zero_threshold_identical() {
        let comparison = ImageComparator::default().compare(&actual_red(), &actual_red());
        assert_eq!(comparison.verdict(), Verdict::Pass);
    }

    #[test]
    fn zero_width_images() {
        let format = PixelFormat::Color(PixelDescriptor::RGB8_UNORM);
        let storage = PixelStorage::new().with_skip(1, 0);
        let empty = PixelSlice::new(storage, format, 0, 2, &[]).unwrap();
        let comparison = ImageComparator::default().compare(&empty, &empty);
        assert_eq!(comparison.verdict(), Verdict::Pass);
        assert_eq!(comparison.max(), Some(0.0));
        assert_eq!(comparison.mean(), Some(0.0));
    }

    #[test]
    fn above_both_thresholds() {
        let comparison = comparator(20.0, 10.0).compare(&actual_rgb(), &expected_rgb());
        assert_eq!(comparison.verdict(), Verdict::Fail);
        // No expected file, so nothing to save
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(comparison.max(), Some(39.0));
        assert!(float_eq(comparison.mean().unwrap(), 18.5));
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);
    }

    #[test]
    fn above_max_threshold() {
        let comparison = comparator(30.0, 20.0).compare(&actual_rgb(), &expected_rgb());
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(
            comparison.message("a", "b"),
            "Images a and b have max delta above threshold, actual 39 but at most 30 expected. \
             Mean delta 18.5 is within threshold 20. Delta image:\n          |?M|\n        \
             Pixels above max/mean threshold:\n          \
             [1,1] #abcd85, expected #abcdfa (Δ = 39)\n"
        );
    }

    #[test]
    fn above_mean_threshold() {
        let comparison = comparator(50.0, 18.0).compare(&actual_rgb(), &expected_rgb());
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(
            comparison.message("a", "b"),
            "Images a and b have mean delta above threshold, actual 18.5 but at most 18 \
             expected. Max delta 39 is within threshold 50. Delta image:\n          |?M|\n        \
             Pixels above max/mean threshold:\n          \
             [1,1] #abcd85, expected #abcdfa (Δ = 39)\n          \
             [1,0] #5647ec, expected #5610ed (Δ = 18.6667)\n"
        );
    }

    #[test]
    fn within_thresholds() {
        let comparison = comparator(40.0, 20.0).compare(&actual_rgb(), &expected_rgb());
        assert_eq!(comparison.verdict(), Verdict::PassVerbose);
        assert!(comparison.passed());
        assert_eq!(comparison.flags(), StatusFlags::VERBOSE);
        assert_eq!(comparison.message("a", "b"), RGB_VERBOSE);
    }

    #[test]
    fn within_thresholds_no_outliers() {
        let comparison = comparator(40.0, 40.0).compare(&actual_rgb(), &expected_rgb());
        assert_eq!(comparison.flags(), StatusFlags::VERBOSE);
        assert!(comparison.outliers().unwrap().is_empty());
        assert_eq!(
            comparison.message("a", "b"),
            "Images a and b have deltas 39/18.5 below threshold 40/40. Delta image:\n          \
             |?M|\n"
        );
    }

    #[test]
    fn outlier_limit() {
        let comparison = comparator(20.0, 10.0)
            .with_max_outliers(1)
            .compare(&actual_rgb(), &expected_rgb());
        assert!(comparison.outliers().unwrap().is_truncated());
        assert!(comparison.message("a", "b").ends_with(
            "|?M|\n        Top 1 out of 3 pixels above max/mean threshold:\n\
             \x20         [1,1] #abcd85, expected #abcdfa (Δ = 39)\n"
        ));
    }

    #[test]
    fn specials() {
        let comparison = comparator(1.5, 0.5).compare(&actual_specials(), &expected_specials());
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert!(float_eq(comparison.max().unwrap(), 3.1));
        assert!(comparison.mean().unwrap().is_nan());
        // NaN sign depends on how the specials were summed
        assert_eq!(
            comparison.message("a", "b").replace("-nan", "nan"),
            "Images a and b have both max and mean delta above threshold, actual 3.1/nan but \
             at most 1.5/0.5 expected. Delta image:\n          |MMMM M ,M|\n        \
             Pixels above max/mean threshold:\n          \
             [5,0] Vector(-inf), expected Vector(inf) (Δ = inf)\n          \
             [3,0] Vector(0.3), expected Vector(nan) (Δ = nan)\n          \
             [2,0] Vector(nan), expected Vector(0.3) (Δ = nan)\n          \
             [1,0] Vector(0.3), expected Vector(-inf) (Δ = inf)\n          \
             [0,0] Vector(inf), expected Vector(1) (Δ = inf)\n          \
             [8,0] Vector(3), expected Vector(-0.1) (Δ = 3.1)\n"
        );
    }

    #[test]
    fn specials_fail_mean_only() {
        let comparison = comparator(15.0, 0.5).compare(&actual_specials(), &expected_specials());
        assert_eq!(comparison.verdict(), Verdict::Fail);
        let message = comparison.message("a", "b").replace("-nan", "nan");
        assert!(
            message.starts_with(
                "Images a and b have mean delta above threshold, actual nan but at most 0.5 \
                 expected. Max delta 3.1 is within threshold 15. Delta image:\n          \
                 |MMMM M ,M|\n        Pixels above max/mean threshold:\n"
            ),
            "{message}"
        );
        assert_eq!(message.lines().count(), 9);
    }

    #[test]
    fn different_size() {
        let data = [0u8; 4 * 15];
        let format = PixelFormat::Color(PixelDescriptor::R32F);
        let a = PixelSlice::new(PixelStorage::new(), format, 3, 4, &data).unwrap();
        let b = PixelSlice::new(PixelStorage::new(), format, 3, 5, &data).unwrap();
        let comparison = ImageComparator::default().compare(&a, &b);
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(comparison.max(), None);
        assert_eq!(
            comparison.message("a", "b"),
            "Images a and b have different size, actual Vector(3, 4) but Vector(3, 5) expected.\n"
        );
    }

    #[test]
    fn different_format() {
        let data = [0u8; 16 * 12];
        let a = PixelSlice::new(
            PixelStorage::new(),
            PixelFormat::Color(PixelDescriptor::RGBA32F),
            3,
            4,
            &data,
        )
        .unwrap();
        let b = PixelSlice::new(
            PixelStorage::new(),
            PixelFormat::Color(PixelDescriptor::RGB32F),
            3,
            4,
            &data,
        )
        .unwrap();
        let comparison = ImageComparator::default().compare(&a, &b);
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(
            comparison.message("a", "b"),
            "Images a and b have different format, actual PixelFormat::RGBA32F but \
             PixelFormat::RGB32F expected.\n"
        );
    }

    #[test]
    fn unsupported_formats() {
        let data = [0u8; 4];
        let compare = |format| {
            let image = PixelSlice::new(PixelStorage::new(), format, 1, 1, &data).unwrap();
            ImageComparator::default().compare(&image, &image).message("a", "b")
        };
        assert_eq!(
            compare(PixelFormat::ImplementationSpecific {
                code: 0xdead,
                pixel_size: 4
            }),
            "Images a and b can't be compared: can't compare implementation-specific pixel \
             formats.\n"
        );
        assert_eq!(
            compare(PixelFormat::Depth24UnormStencil8UI),
            "Images a and b can't be compared: packed depth/stencil formats are not supported \
             yet.\n"
        );
    }

    #[test]
    fn colored_message() {
        let comparison = comparator(20.0, 10.0).compare(&actual_rgb(), &expected_rgb());
        let mut out = String::new();
        comparison
            .print_message(&mut TextSink::new(&mut out).with_colors(true), "a", "b")
            .unwrap();
        assert!(out.contains("|\x1b[1;33m?\x1b[0m\x1b[1;31mM\x1b[0m|"), "{out}");
        assert!(out.contains("(Δ = \x1b[1;31m39\x1b[0m)"), "{out}");
        assert!(out.contains("(Δ = \x1b[1;33m16\x1b[0m)"), "{out}");
    }

    // -- Typed pixels -------------------------------------------------------

    #[test]
    fn pixels_infer_expected_format() {
        let pixels = actual_rgb_pixels();
        let comparison = comparator(20.0, 10.0).compare_pixels(pixels.as_ref(), &expected_rgb());
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);

        let comparison = comparator(40.0, 20.0).compare_pixels(pixels.as_ref(), &expected_rgb());
        assert_eq!(comparison.verdict(), Verdict::PassVerbose);
    }

    #[test]
    fn pixels_different_format() {
        let data = [0u8; 12 * 12];
        let expected = PixelSlice::new(
            PixelStorage::new(),
            PixelFormat::Color(PixelDescriptor::RGB32F),
            3,
            4,
            &data,
        )
        .unwrap();
        let pixels = Img::new(vec![Rgba::new(0.0f32, 0.0, 0.0, 0.0); 12], 3, 4);
        let comparison = ImageComparator::default().compare_pixels(pixels.as_ref(), &expected);
        assert_eq!(
            comparison.message("a", "b"),
            "Images a and b have different format, actual PixelFormat::RGBA32F but \
             PixelFormat::RGB32F expected.\n"
        );
    }

    // -- Files --------------------------------------------------------------

    #[test]
    fn files() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, expected) = rgb_files(dir.path());

        let comparison = comparator(20.0, 10.0).compare_files(&actual, &expected);
        assert_eq!(
            comparison.flags(),
            StatusFlags::FAILED | StatusFlags::DIAGNOSTIC
        );
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);

        let comparison = comparator(40.0, 20.0).compare_files(&actual, &expected);
        assert_eq!(comparison.flags(), StatusFlags::VERBOSE);
        assert_eq!(comparison.message("a", "b"), RGB_VERBOSE);

        let comparison = comparator(40.0, 20.0).compare_files(&expected, &expected);
        assert_eq!(comparison.flags(), StatusFlags::empty());
    }

    #[test]
    fn image_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_, expected) = rgb_files(dir.path());

        let comparison = comparator(20.0, 10.0).compare_to_file(&actual_rgb(), &expected);
        assert_eq!(
            comparison.flags(),
            StatusFlags::FAILED | StatusFlags::DIAGNOSTIC
        );
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);

        let comparison = comparator(40.0, 20.0).compare_to_file(&actual_rgb(), &expected);
        assert_eq!(comparison.flags(), StatusFlags::VERBOSE);
    }

    #[test]
    fn file_to_image() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, _) = rgb_files(dir.path());

        let comparison = comparator(20.0, 10.0).compare_file_to_image(&actual, &expected_rgb());
        // Nothing to name a diagnostic after
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);
    }

    #[test]
    fn pixels_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_, expected) = rgb_files(dir.path());
        let pixels = actual_rgb_pixels();

        let comparison =
            comparator(20.0, 10.0).compare_pixels_to_file(pixels.as_ref(), &expected);
        assert_eq!(
            comparison.flags(),
            StatusFlags::FAILED | StatusFlags::DIAGNOSTIC
        );
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);
    }

    #[test]
    fn importer_plugin_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, expected) = rgb_files(dir.path());
        let importers = PluginManager::<dyn ImageImporter>::new();
        let comparator = comparator(20.0, 10.0).with_importers(&importers);

        for comparison in [
            comparator.compare_files(&actual, &expected),
            comparator.compare_to_file(&actual_rgb(), &expected),
            comparator.compare_file_to_image(&actual, &expected_rgb()),
        ] {
            assert_eq!(comparison.flags(), StatusFlags::FAILED);
            assert_eq!(
                comparison.message("a", "b"),
                "AnyImageImporter plugin could not be loaded.\n"
            );
        }

        // In-memory images don't need the importer
        let comparison = comparator.compare(&actual_rgb(), &expected_rgb());
        assert_eq!(comparison.message("a", "b"), RGB_ERROR);
    }

    #[test]
    fn actual_load_failed() {
        let dir = tempfile::tempdir().unwrap();
        let (_, expected) = rgb_files(dir.path());
        let missing = dir.path().join("nonexistent.tga");

        let comparison = ImageComparator::default().compare_files(&missing, &expected);
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(
            comparison.message("a", "b"),
            format!("Actual image a ({}) could not be loaded.\n", missing.display())
        );

        let comparison =
            ImageComparator::default().compare_file_to_image(&missing, &expected_rgb());
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
    }

    #[test]
    fn expected_load_failed() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, _) = rgb_files(dir.path());
        let missing = dir.path().join("nonexistent.tga");
        let message = format!("Expected image b ({}) could not be loaded.\n", missing.display());

        // The actual image is available, so it can still be saved
        for comparison in [
            ImageComparator::default().compare_files(&actual, &missing),
            ImageComparator::default().compare_to_file(&actual_rgb(), &missing),
            ImageComparator::default()
                .compare_pixels_to_file(actual_rgb_pixels().as_ref(), &missing),
        ] {
            assert_eq!(
                comparison.flags(),
                StatusFlags::FAILED | StatusFlags::DIAGNOSTIC
            );
            assert_eq!(comparison.message("a", "b"), message);
        }
    }

    #[test]
    fn actual_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let (_, expected) = rgb_files(dir.path());
        let compressed = compressed_file(dir.path());

        let comparison = ImageComparator::default().compare_files(&compressed, &expected);
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
        assert_eq!(
            comparison.message("a", "b"),
            format!(
                "Actual image a ({}) is compressed, comparison not possible.\n",
                compressed.display()
            )
        );

        let comparison =
            ImageComparator::default().compare_file_to_image(&compressed, &expected_rgb());
        assert_eq!(comparison.flags(), StatusFlags::FAILED);
    }

    #[test]
    fn expected_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, _) = rgb_files(dir.path());
        let compressed = compressed_file(dir.path());
        let message = format!(
            "Expected image b ({}) is compressed, comparison not possible.\n",
            compressed.display()
        );

        for comparison in [
            ImageComparator::default().compare_files(&actual, &compressed),
            ImageComparator::default().compare_to_file(&actual_rgb(), &compressed),
        ] {
            assert_eq!(
                comparison.flags(),
                StatusFlags::FAILED | StatusFlags::DIAGNOSTIC
            );
            assert_eq!(comparison.message("a", "b"), message);
        }

        // Both compressed, the actual one is reported
        let comparison = ImageComparator::default().compare_files(&compressed, &compressed);
        assert!(comparison.message("a", "b").starts_with("Actual image a"));
    }

    // -- Diagnostics --------------------------------------------------------

    #[test]
    fn save_diagnostic_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, expected) = rgb_files(dir.path());
        let save_dir = dir.path().join("diagnostics/nested");

        let comparison = comparator(20.0, 10.0).compare_files(&actual, &expected);
        let mut out = String::new();
        let path = comparison
            .save_diagnostic(&mut TextSink::new(&mut out), &save_dir)
            .unwrap();
        assert_eq!(path, save_dir.join("CompareImageExpected.tga"));
        assert_eq!(out, format!("-> {}\n", path.display()));

        // The saved file is the actual image
        let comparison = ImageComparator::default().compare_to_file(&actual_rgb(), &path);
        assert_eq!(comparison.verdict(), Verdict::Pass);
    }

    #[test]
    fn save_diagnostic_of_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nonexistent.tga");
        let pixels = actual_rgb_pixels();

        let comparison =
            ImageComparator::default().compare_pixels_to_file(pixels.as_ref(), &missing);
        let mut out = String::new();
        let path = comparison
            .save_diagnostic(&mut TextSink::new(&mut out), dir.path())
            .unwrap();
        assert_eq!(path, missing);

        let comparison = ImageComparator::default().compare_to_file(&actual_rgb(), &path);
        assert_eq!(comparison.verdict(), Verdict::Pass);
    }

    #[test]
    fn save_diagnostic_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, expected) = rgb_files(dir.path());
        let mut out = String::new();

        let passed = comparator(40.0, 20.0).compare_files(&actual, &expected);
        assert!(matches!(
            passed.save_diagnostic(&mut TextSink::new(&mut out), dir.path()),
            Err(SaveError::NothingToSave)
        ));

        let in_memory = comparator(20.0, 10.0).compare(&actual_rgb(), &expected_rgb());
        assert!(matches!(
            in_memory.save_diagnostic(&mut TextSink::new(&mut out), dir.path()),
            Err(SaveError::NothingToSave)
        ));
        assert_eq!(out, "");
    }

    #[test]
    fn save_diagnostic_converter_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, expected) = rgb_files(dir.path());
        let converters = PluginManager::<dyn ImageConverter>::new();
        let save_dir = dir.path().join("saved");

        let comparison = comparator(20.0, 10.0)
            .with_converters(&converters)
            .compare_files(&actual, &expected);
        assert_eq!(
            comparison.flags(),
            StatusFlags::FAILED | StatusFlags::DIAGNOSTIC
        );
        let mut out = String::new();
        let err = comparison
            .save_diagnostic(&mut TextSink::new(&mut out), &save_dir)
            .unwrap_err();
        assert_eq!(err.to_string(), "AnyImageConverter plugin could not be loaded");
        assert!(!save_dir.exists());
        assert_eq!(out, "");
    }

    #[test]
    fn save_diagnostic_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let (actual, _) = rgb_files(dir.path());
        let compressed = compressed_file(dir.path());
        let save_dir = dir.path().join("saved");

        let comparison = ImageComparator::default().compare_files(&actual, &compressed);
        let mut out = String::new();
        let err = comparison
            .save_diagnostic(&mut TextSink::new(&mut out), &save_dir)
            .unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedExtension { .. }));
        assert!(err.to_string().starts_with("AnyImageConverter can't write "));
        assert!(err.to_string().ends_with("CompareImageCompressed.dds"));
        assert!(!save_dir.exists());
        assert_eq!(out, "");
        // Saving doesn't change the outcome
        assert_eq!(comparison.verdict(), Verdict::Fail);
    }

    #[test]
    fn status_flags() {
        let flags = StatusFlags::FAILED | StatusFlags::DIAGNOSTIC;
        assert!(flags.contains(StatusFlags::FAILED));
        assert!(!flags.contains(StatusFlags::VERBOSE));
        assert!(!flags.is_empty());
        assert_eq!(StatusFlags::default(), StatusFlags::empty());
    }
}
