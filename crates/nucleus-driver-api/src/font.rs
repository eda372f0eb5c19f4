//! Font and logo asset records and best-fit selection against console size.

/// A selectable glyph set, identified by name for `consoleFont=<name>`
/// command-line matching and by recommended pixel dimensions for best-fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub name: &'static str,
    pub recommended_width: u32,
    pub recommended_height: u32,
    pub priority: u8,
}

/// A selectable boot splash image, matched only by best-fit (no name-based
/// selection exists for logos).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logo {
    pub name: &'static str,
    pub recommended_width: u32,
    pub recommended_height: u32,
    pub priority: u8,
}

/// A registered asset whose fit against a console's pixel dimensions can be
/// scored, shared by [`Font`] and [`Logo`] so `best_fit` has one
/// implementation for both.
pub trait SizeCandidate {
    /// The dimensions this asset was designed for, in pixels.
    fn recommended_size(&self) -> (u32, u32);
    /// Tiebreak value; lower wins when two candidates score equally.
    fn priority(&self) -> u8;
}

impl SizeCandidate for Font {
    fn recommended_size(&self) -> (u32, u32) {
        (self.recommended_width, self.recommended_height)
    }
    fn priority(&self) -> u8 {
        self.priority
    }
}

impl SizeCandidate for Logo {
    fn recommended_size(&self) -> (u32, u32) {
        (self.recommended_width, self.recommended_height)
    }
    fn priority(&self) -> u8 {
        self.priority
    }
}

/// Picks the candidate whose recommended size is closest to `target`
/// (Manhattan distance), breaking ties by the lower `priority` value.
///
/// Returns `None` for an empty candidate list.
#[must_use]
pub fn best_fit<T: SizeCandidate>(candidates: &[T], target: (u32, u32)) -> Option<&T> {
    candidates
        .iter()
        .min_by_key(|c| {
            let (w, h) = c.recommended_size();
            let score = w.abs_diff(target.0) + h.abs_diff(target.1);
            (score, c.priority())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(name: &'static str, w: u32, h: u32, priority: u8) -> Font {
        Font {
            name,
            recommended_width: w,
            recommended_height: h,
            priority,
        }
    }

    #[test]
    fn picks_lowest_distance_score() {
        let fonts = [font("small", 8, 16, 0), font("big", 16, 32, 0)];
        let chosen = best_fit(&fonts, (9, 17)).unwrap();
        assert_eq!(chosen.name, "small");
    }

    #[test]
    fn ties_broken_by_lower_priority() {
        let fonts = [font("a", 8, 16, 5), font("b", 8, 16, 1)];
        let chosen = best_fit(&fonts, (8, 16)).unwrap();
        assert_eq!(chosen.name, "b");
    }

    #[test]
    fn empty_candidate_list_returns_none() {
        let fonts: [Font; 0] = [];
        assert!(best_fit(&fonts, (80, 25)).is_none());
    }
}
