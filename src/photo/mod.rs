// Copyright (c) 2025 Mediacore Contributors
// SPDX-License-Identifier: MIT

//! Thumbnail selection and display-grid math.
//!
//! A photo carries several resolution variants; these selectors pick the
//! one a caller should show or fetch. All of them renew the embedded file
//! stubs through the registry first, so decisions are always taken on
//! canonical download state, never on stale copies from older responses.

use crate::registry::FileRegistry;
use crate::types::{Photo, PhotoSize};

/// Pixel dimensions of one display-grid cell plus the grid's size caps,
/// supplied by the configuration layer.
#[derive(Debug, Clone, Copy)]
pub struct DisplayConfig {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Default width bound for [`best`], in cells.
    pub max_cols: u32,
    /// Default height bound for [`best`], in cells.
    pub max_rows: u32,
}

/// Grid extent of a pixel dimension: whole cells occupied and the pixel
/// margin that centers the content inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFit {
    pub cells: u32,
    pub margin: u32,
}

/// Number of cells needed to contain `pixels`, and the leftover margin.
pub fn cells_for(pixels: u32, cell: u32) -> CellFit {
    let cell = cell.max(1);
    let cells = pixels.div_ceil(cell);
    CellFit {
        cells,
        margin: (cells * cell - pixels) / 2,
    }
}

/// Highest-resolution variant that is already downloaded or currently
/// eligible for download.
pub fn highres(registry: &FileRegistry, photo: &mut Photo) -> Option<PhotoSize> {
    for size in photo.sizes.iter_mut().rev() {
        let file = registry.renew(&mut size.file);
        if file.downloaded_or_eligible() {
            return Some(size.clone());
        }
    }
    None
}

/// Low-res placeholder while the preferred variant is pending.
///
/// Preference order, each category scanned from the lowest resolution up:
/// anything already downloaded, else anything currently downloading, else
/// anything eligible for download.
pub fn thumb(registry: &FileRegistry, photo: &mut Photo) -> Option<PhotoSize> {
    for size in photo.sizes.iter_mut() {
        registry.renew(&mut size.file);
    }

    photo
        .sizes
        .iter()
        .find(|s| s.file.local.is_downloading_completed)
        .or_else(|| {
            photo
                .sizes
                .iter()
                .find(|s| s.file.local.is_downloading_active)
        })
        .or_else(|| photo.sizes.iter().find(|s| s.file.local.can_be_downloaded))
        .cloned()
}

/// Best variant for a display slot of `max_cols` x `max_rows` cells.
///
/// Returns the highest-resolution downloaded-or-eligible variant whose
/// scaled dimensions fit the pixel bounds; when none fits, the
/// highest-resolution candidate overall. None only when no variant is
/// downloaded or eligible at all.
pub fn best(
    registry: &FileRegistry,
    photo: &mut Photo,
    max_cols: u32,
    max_rows: u32,
    display: &DisplayConfig,
) -> Option<PhotoSize> {
    let max_width = i64::from(max_cols) * i64::from(display.cell_width);
    let max_height = i64::from(max_rows) * i64::from(display.cell_height);

    let mut fitting = None;
    let mut fallback = None;
    for size in photo.sizes.iter_mut() {
        let file = registry.renew(&mut size.file);
        if !file.downloaded_or_eligible() {
            continue;
        }
        // Sizes ascend, so the last hit is the highest resolution.
        fallback = Some(size.clone());
        if fits_bounds(size.width, size.height, max_width, max_height) {
            fitting = Some(size.clone());
        }
    }
    fitting.or(fallback)
}

/// Scaled to the width bound the height must hold, or scaled to the
/// height bound the width must hold.
fn fits_bounds(width: i32, height: i32, max_width: i64, max_height: i64) -> bool {
    if width <= 0 || height <= 0 {
        return false;
    }
    let (w, h) = (i64::from(width), i64::from(height));
    h * max_width <= max_height * w || w * max_height <= max_width * h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::types::{File, FileId, LocalFile};

    fn display() -> DisplayConfig {
        DisplayConfig {
            cell_width: 10,
            cell_height: 10,
            max_cols: 40,
            max_rows: 20,
        }
    }

    fn size(kind: &str, id: FileId, width: i32, height: i32) -> PhotoSize {
        PhotoSize {
            kind: kind.into(),
            width,
            height,
            file: File {
                id,
                size: 100,
                ..Default::default()
            },
        }
    }

    /// [100x100, 320x320, 800x800], ascending, all idle and ineligible.
    fn photo() -> Photo {
        Photo {
            sizes: vec![
                size("s", 1, 100, 100),
                size("m", 2, 320, 320),
                size("x", 3, 800, 800),
            ],
        }
    }

    fn registry() -> FileRegistry {
        let (backend, _rx) = Backend::channel();
        FileRegistry::new(backend)
    }

    fn mark(registry: &FileRegistry, id: FileId, local: LocalFile) {
        registry.ensure(File {
            id,
            size: 100,
            local,
            ..Default::default()
        });
    }

    #[test]
    fn cells_round_up_and_center() {
        assert_eq!(cells_for(95, 10), CellFit { cells: 10, margin: 2 });
        assert_eq!(cells_for(100, 10), CellFit { cells: 10, margin: 0 });
        assert_eq!(cells_for(1, 10), CellFit { cells: 1, margin: 4 });
    }

    #[test]
    fn highres_picks_largest_usable_variant() {
        let registry = registry();
        let mut photo = photo();
        mark(
            &registry,
            2,
            LocalFile {
                can_be_downloaded: true,
                ..Default::default()
            },
        );

        let pick = highres(&registry, &mut photo).expect("a variant");
        assert_eq!(pick.file.id, 2);
        assert_eq!(pick.width, 320);
    }

    #[test]
    fn highres_none_when_nothing_is_usable() {
        let registry = registry();
        assert!(highres(&registry, &mut photo()).is_none());
    }

    #[test]
    fn thumb_prefers_downloaded_over_downloading_over_eligible() {
        let registry = registry();
        let mut photo = photo();
        mark(
            &registry,
            3,
            LocalFile {
                is_downloading_completed: true,
                ..Default::default()
            },
        );
        mark(
            &registry,
            2,
            LocalFile {
                is_downloading_active: true,
                ..Default::default()
            },
        );
        mark(
            &registry,
            1,
            LocalFile {
                can_be_downloaded: true,
                ..Default::default()
            },
        );

        // Downloaded wins even though it is the highest resolution.
        assert_eq!(thumb(&registry, &mut photo).unwrap().file.id, 3);
    }

    #[test]
    fn thumb_falls_through_the_categories() {
        let registry = registry();
        let mut photo = photo();
        mark(
            &registry,
            2,
            LocalFile {
                can_be_downloaded: true,
                ..Default::default()
            },
        );

        assert_eq!(thumb(&registry, &mut photo).unwrap().file.id, 2);

        mark(
            &registry,
            1,
            LocalFile {
                is_downloading_active: true,
                ..Default::default()
            },
        );
        assert_eq!(thumb(&registry, &mut photo).unwrap().file.id, 1);
    }

    #[test]
    fn thumb_none_when_no_category_matches() {
        let registry = registry();
        assert!(thumb(&registry, &mut photo()).is_none());
    }

    #[test]
    fn thumb_uses_canonical_state_over_stale_stubs() {
        let registry = registry();
        let mut photo = photo();
        // The embedded stub claims eligibility, the registry knows better.
        photo.sizes[0].file.local.can_be_downloaded = true;
        mark(&registry, 1, LocalFile::default());

        assert!(thumb(&registry, &mut photo).is_none());
    }

    #[test]
    fn best_picks_largest_fitting_variant() {
        let registry = registry();
        let mut photo = photo();
        for id in [1, 2, 3] {
            mark(
                &registry,
                id,
                LocalFile {
                    can_be_downloaded: true,
                    ..Default::default()
                },
            );
        }

        // 40x20 cells at 10px: 400x200 pixel bounds.
        let pick = best(&registry, &mut photo, 40, 20, &display()).expect("a variant");
        assert_eq!(pick.file.id, 3, "highest-resolution fitting candidate");
    }

    #[test]
    fn best_skips_unusable_variants() {
        let registry = registry();
        let mut photo = photo();
        mark(
            &registry,
            1,
            LocalFile {
                can_be_downloaded: true,
                ..Default::default()
            },
        );

        let pick = best(&registry, &mut photo, 40, 20, &display()).expect("a variant");
        assert_eq!(pick.file.id, 1);
    }

    #[test]
    fn best_none_without_candidates() {
        let registry = registry();
        assert!(best(&registry, &mut photo(), 40, 20, &display()).is_none());
    }

    #[test]
    fn degenerate_variant_never_fits() {
        assert!(!fits_bounds(0, 100, 400, 200));
        assert!(fits_bounds(800, 600, 400, 200));
    }
}
