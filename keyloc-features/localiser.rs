use image::{imageops, GrayImage, Rgb, RgbImage};
use keyloc_core::{Descriptor, Keypoint, Match};
use log::{debug, info, warn};

use crate::config::LocaliserConfig;
use crate::draw::{draw_keypoints, draw_matches, draw_outline, side_by_side, OUTLINE_COLOUR};
use crate::error::FeatureResult;
use crate::extractor::Brisk;
use crate::homography::{find_homography, Homography};
use crate::matcher::HammingMatcher;

const KEYPOINT_COLOUR: Rgb<u8> = Rgb([96, 96, 255]);

/// Everything learned about where the object sits in the scene
#[derive(Debug, Clone)]
pub struct Localisation {
    pub object_keypoints: Vec<Keypoint>,
    pub scene_keypoints: Vec<Keypoint>,
    /// Object (query) to scene (train) correspondences that passed the matcher
    pub matches: Vec<Match>,
    /// RANSAC inlier flag per match; empty when no homography was found
    pub inliers: Vec<bool>,
    pub homography: Option<Homography>,
    /// Object image corners projected into the scene, clockwise from top-left
    pub outline: Option<[(f64, f64); 4]>,
}

impl Localisation {
    pub fn is_located(&self) -> bool {
        self.homography.is_some()
    }

    pub fn inlier_count(&self) -> usize {
        self.inliers.iter().filter(|&&i| i).count()
    }
}

/// Finds a known object in a scene by matching binary keypoint descriptors
#[derive(Debug, Clone)]
pub struct ObjectLocaliser {
    cfg: LocaliserConfig,
    brisk: Brisk,
    matcher: HammingMatcher,
}

impl ObjectLocaliser {
    pub fn new(cfg: LocaliserConfig) -> FeatureResult<Self> {
        cfg.validate()?;
        let brisk = Brisk::new(cfg.brisk.clone())?;
        let matcher = HammingMatcher::new(cfg.matcher.clone())?;
        Ok(Self { cfg, brisk, matcher })
    }

    pub fn config(&self) -> &LocaliserConfig {
        &self.cfg
    }

    /// Detect, describe and match both images, then fit a homography.
    ///
    /// Failing to fit a homography is not an error: the result then carries
    /// the matches alone.
    pub fn localise(&self, object: &RgbImage, scene: &RgbImage) -> FeatureResult<Localisation> {
        let (object_keypoints, object_desc) = self.features(object)?;
        let (scene_keypoints, scene_desc) = self.features(scene)?;

        let matches = self.matcher.match_descriptors(&object_desc, &scene_desc);
        debug!(
            "{} object / {} scene keypoints, {} matches",
            object_keypoints.len(),
            scene_keypoints.len(),
            matches.len()
        );

        let src: Vec<(f64, f64)> = matches
            .iter()
            .map(|m| {
                let kp = &object_keypoints[m.query_idx];
                (kp.x as f64, kp.y as f64)
            })
            .collect();
        let dst: Vec<(f64, f64)> = matches
            .iter()
            .map(|m| {
                let kp = &scene_keypoints[m.train_idx];
                (kp.x as f64, kp.y as f64)
            })
            .collect();

        let (homography, inliers) = match find_homography(&src, &dst, &self.cfg.ransac) {
            Ok(estimate) => {
                info!("object located with {}/{} inlier matches", estimate.inlier_count(), matches.len());
                (Some(estimate.homography), estimate.inliers)
            }
            Err(e) => {
                warn!("object not located, drawing raw matches: {}", e);
                (None, Vec::new())
            }
        };

        let outline = homography.as_ref().and_then(|h| project_outline(h, object.width(), object.height()));

        Ok(Localisation {
            object_keypoints,
            scene_keypoints,
            matches,
            inliers,
            homography,
            outline,
        })
    }

    /// Object and scene side by side with keypoints, matches and the projected outline
    pub fn render(&self, object: &RgbImage, scene: &RgbImage, loc: &Localisation) -> RgbImage {
        let mut canvas = side_by_side(object, scene);
        let offset = object.width() as f32;

        if self.cfg.draw_keypoints {
            draw_keypoints(&mut canvas, &loc.object_keypoints, 0.0, KEYPOINT_COLOUR);
            draw_keypoints(&mut canvas, &loc.scene_keypoints, offset, KEYPOINT_COLOUR);
        }

        let mask = (self.cfg.inliers_only && loc.is_located()).then_some(loc.inliers.as_slice());
        draw_matches(&mut canvas, &loc.object_keypoints, &loc.scene_keypoints, &loc.matches, offset, mask);

        if let Some(outline) = &loc.outline {
            draw_outline(&mut canvas, outline, offset, OUTLINE_COLOUR);
        }
        canvas
    }

    /// Localise `object` in `scene` and return the annotated side-by-side image
    pub fn brisk(&self, object: &RgbImage, scene: &RgbImage) -> FeatureResult<RgbImage> {
        let loc = self.localise(object, scene)?;
        Ok(self.render(object, scene, &loc))
    }

    fn features(&self, img: &RgbImage) -> FeatureResult<(Vec<Keypoint>, Vec<Descriptor>)> {
        let gray: GrayImage = imageops::grayscale(img);
        self.brisk.detect_and_compute(&gray)
    }
}

fn project_outline(homography: &Homography, width: u32, height: u32) -> Option<[(f64, f64); 4]> {
    let (w, h) = (width as f64, height as f64);
    Some([
        homography.project(0.0, 0.0)?,
        homography.project(w, 0.0)?,
        homography.project(w, h)?,
        homography.project(0.0, h)?,
    ])
}
