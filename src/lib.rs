use image::DynamicImage;
use imageproc::point::Point;
use tracing::instrument;

pub mod assemble;
pub mod clock;
pub mod cluster;
mod error;
pub mod filter;
#[cfg(feature = "onnx")]
pub mod glyph_net;
pub mod label;
pub mod merge;
mod result;
pub mod twins;
pub mod util;

pub use assemble::assemble_text;
pub use clock::keep_time;
pub use cluster::cluster_characters;
pub use error::*;
pub use filter::{filter_by_contour_size, Restrictions};
pub use label::{label_characters, CropOptions, GlyphClassifier};
pub use merge::merge_overlapping;
pub use result::*;
pub use twins::{keep_twins, ClusterFeatures, ClusterPosition, DEFAULT_TWIN_THRESHOLD};

#[cfg(feature = "onnx")]
pub use ort as runtime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReaderOptions {
    pub restrictions: Restrictions,
    pub overlap_threshold: f32,
    pub height_to_dist_ratio: f32,
    pub twin_threshold: f32,
    /// Pixels added around each glyph before classification, 0 leaves rects untouched.
    pub margin: i32,
    /// Invert crops before classification, for light glyphs on a dark overlay.
    pub invert_glyphs: bool,
    /// Blank crop pixels outside the glyph contours before classification.
    pub mask_glyphs: bool,
    /// Drop clusters whose glyphs share neither a height nor a baseline.
    pub uniform_clusters_only: bool,
}

impl ReaderOptions {
    pub fn validate(&self) -> Result<()> {
        fn invalid(name: &'static str, reason: impl Into<String>) -> Result<()> {
            Err(Error::InvalidOption {
                name,
                reason: reason.into(),
            })
        }

        let r = &self.restrictions;
        if !(r.min_area >= 0.0 && r.min_area <= r.max_area) {
            return invalid("restrictions.area", format!("{} > {}", r.min_area, r.max_area));
        }
        if r.min_height > r.max_height {
            return invalid(
                "restrictions.height",
                format!("{} > {}", r.min_height, r.max_height),
            );
        }
        if r.min_width > r.max_width {
            return invalid(
                "restrictions.width",
                format!("{} > {}", r.min_width, r.max_width),
            );
        }
        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return invalid("overlap_threshold", "must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&self.twin_threshold) {
            return invalid("twin_threshold", "must be within 0..=1");
        }
        if !(self.height_to_dist_ratio.is_finite() && self.height_to_dist_ratio > 0.0) {
            return invalid("height_to_dist_ratio", "must be a positive number");
        }
        if self.margin < 0 {
            return invalid("margin", "must not be negative");
        }
        Ok(())
    }
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            restrictions: Restrictions::default(),
            overlap_threshold: 0.5,
            height_to_dist_ratio: 0.5,
            twin_threshold: DEFAULT_TWIN_THRESHOLD,
            margin: 0,
            invert_glyphs: false,
            mask_glyphs: true,
            uniform_clusters_only: false,
        }
    }
}

/// Contours to filtered, merged and margined glyph candidates.
#[instrument(level = "debug", skip(contours, options))]
pub fn extract_characters<I>(
    contours: I,
    frame: FrameSize,
    options: &ReaderOptions,
) -> Vec<CharacterBox>
where
    I: IntoIterator<Item = Vec<Point<i32>>>,
{
    let characters = boxes_from_contours(contours);
    let mut characters = filter_by_contour_size(&characters, &options.restrictions);
    merge_overlapping(&mut characters, options.overlap_threshold);
    if options.margin > 0 {
        for character in characters.iter_mut() {
            character.rect = util::apply_margin(character.rect, options.margin, frame);
        }
    }
    characters
}

/// Labeled glyphs to the texts of one field window.
#[instrument(level = "debug", skip(characters, options), fields(count = characters.len()))]
pub fn select_field(
    characters: Vec<CharacterBox>,
    frame: FrameSize,
    kind: FieldKind,
    options: &ReaderOptions,
) -> Vec<AssembledText> {
    let mut clusters = cluster_characters(characters);
    if options.uniform_clusters_only {
        clusters.retain(|cluster| cluster::same_height(cluster) || cluster::same_level(cluster));
    }
    match kind {
        FieldKind::Name => keep_twins(&mut clusters, frame, true, options.twin_threshold),
        FieldKind::Score => keep_twins(&mut clusters, frame, false, options.twin_threshold),
        FieldKind::Clock => keep_time(&mut clusters),
    }
    assemble_text(clusters, options.height_to_dist_ratio)
}

pub struct ScoreboardReaderBuilder<C> {
    classifier: C,
    options: ReaderOptions,
}

impl<C: GlyphClassifier> ScoreboardReaderBuilder<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            options: ReaderOptions::default(),
        }
    }

    pub fn options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn restrictions(mut self, restrictions: Restrictions) -> Self {
        self.options.restrictions = restrictions;
        self
    }

    pub fn overlap_threshold(mut self, threshold: f32) -> Self {
        self.options.overlap_threshold = threshold;
        self
    }

    pub fn height_to_dist_ratio(mut self, ratio: f32) -> Self {
        self.options.height_to_dist_ratio = ratio;
        self
    }

    pub fn twin_threshold(mut self, threshold: f32) -> Self {
        self.options.twin_threshold = threshold;
        self
    }

    pub fn margin(mut self, margin: i32) -> Self {
        self.options.margin = margin;
        self
    }

    pub fn invert_glyphs(mut self, invert: bool) -> Self {
        self.options.invert_glyphs = invert;
        self
    }

    pub fn mask_glyphs(mut self, mask: bool) -> Self {
        self.options.mask_glyphs = mask;
        self
    }

    pub fn uniform_clusters_only(mut self, uniform_only: bool) -> Self {
        self.options.uniform_clusters_only = uniform_only;
        self
    }

    #[instrument(skip(self))]
    pub fn build(self) -> Result<ScoreboardReader<C>> {
        self.options.validate()?;
        log::debug!("Reader options: {:?}", self.options);
        Ok(ScoreboardReader {
            classifier: self.classifier,
            options: self.options,
        })
    }
}

/// Reads name, score and clock fields out of a score overlay window.
pub struct ScoreboardReader<C> {
    classifier: C,
    options: ReaderOptions,
}

impl<C: GlyphClassifier> ScoreboardReader<C> {
    pub fn builder(classifier: C) -> ScoreboardReaderBuilder<C> {
        ScoreboardReaderBuilder::new(classifier)
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn extract_characters<I>(&self, contours: I, frame: FrameSize) -> Vec<CharacterBox>
    where
        I: IntoIterator<Item = Vec<Point<i32>>>,
    {
        extract_characters(contours, frame, &self.options)
    }

    fn labeled_characters<I>(
        &self,
        image: &DynamicImage,
        contours: I,
    ) -> Result<Vec<CharacterBox>>
    where
        I: IntoIterator<Item = Vec<Point<i32>>>,
    {
        let frame = FrameSize::from((image.width(), image.height()));
        let characters = self.extract_characters(contours, frame);
        let crop_options = CropOptions {
            mask: self.options.mask_glyphs,
            invert: self.options.invert_glyphs,
        };
        label_characters(characters, image, &self.classifier, crop_options)
    }

    /// Every word in the window, left to right.
    #[instrument(skip(self, image, contours))]
    pub fn read_words<I>(&self, image: &DynamicImage, contours: I) -> Result<Vec<AssembledText>>
    where
        I: IntoIterator<Item = Vec<Point<i32>>>,
    {
        let characters = self.labeled_characters(image, contours)?;
        let clusters = cluster_characters(characters);
        Ok(assemble_text(clusters, self.options.height_to_dist_ratio))
    }

    /// The words of the window that pass the selection rule for `kind`.
    #[instrument(skip(self, image, contours))]
    pub fn read_field<I>(
        &self,
        image: &DynamicImage,
        contours: I,
        kind: FieldKind,
    ) -> Result<Vec<AssembledText>>
    where
        I: IntoIterator<Item = Vec<Point<i32>>>,
    {
        let frame = FrameSize::from((image.width(), image.height()));
        let characters = self.labeled_characters(image, contours)?;
        Ok(select_field(characters, frame, kind, &self.options))
    }
}
