//! Fixed BRIEF sampling pattern.
//!
//! 512 point pairs `(x1, y1, x2, y2)` inside a 27×27 patch, drawn from an
//! isotropic Gaussian (σ ≈ 6.2) and kept within radius 13. Stored descriptors
//! are only comparable while this table is unchanged.

use crate::features::{TestPair, MAX_DESCRIPTOR_BITS};

#[rustfmt::skip]
pub(crate) const SAMPLING_PATTERN: [TestPair; MAX_DESCRIPTOR_BITS] = [
    (-8, -1, 0, 2), (-1, 12, 10, -1), (1, -2, 9, -4), (-2, -3, -4, -1),
    (1, -8, -3, 6), (-10, 1, 4, 9), (8, 2, 7, -5), (-4, -8, 2, 6),
    (7, 1, -1, -3), (-1, -5, -2, -8), (0, -1, -4, 1), (-1, -1, -13, -4),
    (9, 5, -1, -2), (4, 9, -3, 1), (3, -2, -4, 11), (-1, -1, 7, 7),
    (6, 5, -1, 8), (7, 1, 5, 2), (3, -7, 4, -4), (-3, -4, 7, 0),
    (-7, -7, 1, 4), (2, 1, -4, -7), (0, -1, 5, 1), (-7, 1, 12, 0),
    (4, -2, 2, -1), (-1, 4, -7, 6), (2, 2, -11, 0), (-5, -2, 3, 0),
    (0, 2, 0, 5), (-1, 1, -4, -6), (-3, 0, 6, 2), (5, -7, -4, -2),
    (-5, -2, -5, -3), (9, -6, -7, 7), (2, 2, -3, 4), (-10, 1, -7, -5),
    (2, 0, -5, -9), (-5, 3, -1, 11), (1, -3, -7, -5), (8, -7, -2, -6),
    (-7, -2, -3, 3), (-2, 7, 3, -11), (-6, 11, -1, -8), (8, -7, -2, -5),
    (-4, 4, -6, 4), (-4, 0, 5, -6), (4, -6, 3, 10), (3, 3, -1, 7),
    (5, -4, 0, 4), (9, -1, 2, -2), (-8, 4, 5, -5), (4, -3, -2, 3),
    (5, -3, -2, 10), (-4, 6, -5, -1), (-6, -2, 3, 0), (-2, 0, -5, 3),
    (-7, 8, 5, -5), (-4, 2, 1, -11), (-4, -5, 2, 0), (4, -11, -4, 2),
    (-1, -1, 5, 4), (-3, 2, 2, 2), (-2, 8, 1, 4), (3, 3, 2, -7),
    (6, -9, 3, 11), (9, -5, -6, 0), (10, -1, 4, -3), (-10, -10, -3, 0),
    (-6, 8, -13, 3), (4, 3, -4, -6), (-3, -5, -2, -1), (-8, 3, 3, 11),
    (-6, 9, -5, 9), (-2, -1, 7, 12), (-5, 3, 5, -8), (8, -8, 9, 3),
    (-6, -3, -1, -12), (6, -2, 6, 3), (-7, -1, -2, 4), (4, -3, 3, 4),
    (4, -5, 13, 6), (-9, 1, 1, -1), (9, -3, 10, -8), (3, -1, 10, -4),
    (4, 3, 1, 3), (-5, -1, -4, 3), (1, 2, 9, -8), (6, -5, -6, -3),
    (13, 4, -3, -4), (-5, 4, -7, 1), (4, 2, 4, -3), (-5, 3, 5, -2),
    (-6, 4, -1, -2), (0, 13, 5, 4), (3, -7, -8, -5), (-5, -10, 9, -1),
    (4, 4, 0, -8), (2, -4, -5, 2), (9, -1, 2, 8), (3, 0, -3, 10),
    (-12, -6, -9, 4), (-7, -5, -1, -4), (-1, -5, -4, -6), (-2, 3, 4, -2),
    (-2, -8, -4, -4), (1, 3, -2, 8), (-9, -4, 12, 2), (-4, 5, -8, -4),
    (2, 2, 6, -4), (-1, 0, -3, -6), (-1, 5, 8, -6), (1, 2, 10, 0),
    (9, -5, 9, -2), (6, -11, 1, 0), (4, 1, 1, 10), (-2, 3, -7, -2),
    (2, -2, -7, 2), (-7, -7, 2, -2), (-2, -2, 2, 0), (3, 3, 0, -3),
    (1, 10, -10, -1), (3, -1, 5, -4), (0, -10, -2, -5), (1, 5, -1, 6),
    (-3, 12, -3, 2), (2, -2, 13, -3), (7, -7, -9, -3), (-2, 1, -2, -10),
    (6, -6, -3, -2), (-6, 1, -5, 13), (-1, 9, -5, -4), (-13, -10, -8, 3),
    (-1, -2, -9, 10), (1, -2, -4, 6), (-12, 6, 3, 10), (-1, 3, 2, -2),
    (0, -1, -2, 2), (-7, 6, -7, -1), (3, -4, 4, -5), (-5, -5, -4, -6),
    (-2, -2, 1, 8), (5, 1, -7, 6), (0, 5, -12, -6), (-6, 4, -8, 3),
    (4, -1, 0, -5), (7, -1, 5, -1), (-6, 12, -3, 6), (-5, -1, 8, -5),
    (-8, 4, 4, -1), (-7, -8, 0, 13), (4, 6, 8, 2), (3, 7, 0, 2),
    (0, 2, 8, 0), (-6, -3, 8, 3), (1, -10, -4, 5), (-3, -4, 3, 10),
    (5, -1, -7, 2), (4, 6, 5, 7), (0, -5, -9, 2), (6, -11, 0, -2),
    (10, 7, 0, 11), (2, 8, 3, 7), (-2, 3, -2, -3), (1, 9, 7, -1),
    (10, 0, 3, -1), (-2, 2, 4, -10), (9, 0, 3, -12), (5, 0, -1, -4),
    (11, -4, -5, -6), (7, 9, 1, -8), (3, 2, 10, 2), (-2, -4, -7, -2),
    (-4, 5, -1, 5), (-3, -8, 2, 4), (1, 10, -8, -1), (2, 8, 2, 0),
    (-4, 6, -5, 0), (4, -5, 9, 2), (-4, -9, 0, 4), (4, 9, -5, -11),
    (-4, 1, -2, 0), (-3, 8, 1, 6), (2, -2, -7, -1), (4, -1, -3, 0),
    (0, 0, 3, 3), (1, 9, -1, -4), (7, -2, -6, -3), (-10, 6, 4, 2),
    (-11, -6, -7, -3), (1, -12, -4, 8), (0, -4, -12, -5), (2, 11, 12, 4),
    (-7, 0, -4, 4), (4, 8, -3, 0), (0, -8, 3, -6), (-1, 1, -8, 8),
    (-6, -4, 9, -10), (5, 5, -7, -9), (-1, 2, -4, 5), (-7, 10, 5, 0),
    (9, -1, 7, -1), (4, -4, 0, -10), (-2, -1, -1, -1), (-2, 1, -4, -3),
    (11, 2, 1, -10), (1, -1, 0, -7), (-4, -5, -4, 6), (7, -6, -1, 2),
    (0, 3, -4, 12), (-4, 8, 13, -1), (-3, 0, 10, 3), (-5, 2, -6, 6),
    (-1, 3, -4, 2), (6, 2, 2, 6), (5, -3, -5, 2), (1, 9, -8, 2),
    (2, -8, -3, -3), (8, -5, 1, 9), (-2, 7, -8, -1), (4, -3, -1, -3),
    (6, 10, 2, -6), (-1, 2, -8, 5), (8, -3, 5, 2), (0, 0, -7, -6),
    (-9, -1, -5, 1), (8, -7, 5, -3), (-1, 1, 6, 5), (1, 5, 3, 2),
    (-4, 0, -2, -5), (11, 2, -1, -3), (0, -1, -4, -8), (-2, -4, 3, 10),
    (0, -1, -10, 0), (0, 2, -2, 8), (1, -2, 3, 10), (5, -8, 12, 6),
    (0, -2, 7, -7), (3, 1, -11, 9), (-10, -1, -8, -4), (-5, 8, -10, -1),
    (2, 6, 0, -4), (0, -5, -2, 6), (-4, 6, 3, 11), (-5, -8, -10, -3),
    (9, 1, 4, -13), (2, -2, -7, -7), (3, -4, 7, -8), (0, 0, 11, -1),
    (-2, 4, -5, -10), (-2, 3, -3, -6), (-3, -3, -4, 3), (2, 2, -5, -3),
    (10, 5, 4, 0), (-3, 2, 9, -9), (-1, 5, -10, 11), (-8, 11, -12, 5),
    (-7, -9, -11, -1), (-6, 5, 0, 4), (7, -2, -2, -2), (-5, 6, 3, 2),
    (4, -6, 4, -7), (1, 4, 4, 0), (-5, -12, 8, -2), (-1, 5, 0, 9),
    (2, 1, -2, 0), (-2, 0, 0, 6), (-1, -1, 2, -8), (4, 6, 7, 0),
    (-1, 5, 1, 2), (4, 11, -2, -2), (-2, -3, 11, 2), (2, -4, -4, -3),
    (5, 9, 12, 0), (1, -8, 2, -6), (0, 2, 2, 7), (3, 8, -3, -4),
    (-7, 5, -4, -2), (4, 4, -3, -1), (7, 2, -4, 11), (0, -4, -7, 2),
    (3, -5, 3, -3), (-5, -3, 0, 12), (-1, -2, 2, -5), (-12, -8, 6, 7),
    (-10, -2, 1, 4), (-10, -4, 2, 4), (-10, -2, -5, 8), (9, -7, -8, -6),
    (2, 6, 3, -8), (10, -5, -5, 2), (4, 4, 3, 0), (3, 4, -3, -1),
    (-5, -7, -3, -5), (5, 2, 0, 0), (-7, 4, -10, 8), (-4, 1, 1, -4),
    (1, 0, 8, -10), (-1, 0, -6, -4), (-4, -7, 2, 9), (-9, 1, -8, 9),
    (0, 7, 10, 6), (-7, 12, -1, 0), (3, 0, -9, 7), (0, -7, 3, -7),
    (-1, 2, -2, -2), (2, 0, 0, 4), (-3, 3, -6, 0), (-2, 3, -8, -3),
    (-2, -9, -5, 1), (-2, 8, 3, 8), (-2, 1, 8, 7), (4, -2, -9, 4),
    (7, 6, -10, 3), (-2, 1, -3, 12), (5, -8, 0, -1), (1, 1, 13, -1),
    (8, -1, 4, 7), (-1, 8, -5, 10), (-2, -5, -4, 3), (-9, -13, 4, 3),
    (1, 3, -11, 2), (0, 6, 4, -2), (7, 0, -2, 6), (5, -1, 4, 4),
    (-5, 7, -4, -3), (0, 5, 4, -2), (-5, 3, 11, -2), (1, 1, -8, 9),
    (1, 7, -1, 9), (-3, -10, -8, 3), (-3, 0, -9, 8), (-5, -5, 1, -1),
    (-3, -3, 1, -2), (6, 5, -11, -5), (-6, -1, -7, 2), (-3, 3, 4, -6),
    (-5, -3, -9, 7), (2, -4, -6, -4), (-4, -2, -9, 2), (-4, 6, 3, 4),
    (9, 3, -7, -7), (7, 8, -3, 11), (11, 3, -5, -9), (-5, -5, -2, -11),
    (2, 0, -4, 6), (-10, -3, -10, 3), (1, 2, 12, 0), (2, -1, -12, 0),
    (-7, 6, 0, 8), (0, 5, 2, -4), (-2, -4, 5, 6), (3, 0, -2, 7),
    (-5, -8, -1, 1), (10, -6, -1, 0), (-6, 5, 4, 3), (2, 12, 3, -1),
    (13, -6, -7, 1), (-3, -6, -8, 6), (-7, 7, -13, 2), (-1, 0, 5, -5),
    (1, 7, 6, 9), (0, -4, 1, 1), (2, 8, 6, -9), (-2, 0, -1, -2),
    (7, 5, -3, 0), (5, 6, 7, -7), (-10, 6, 10, -1), (1, -8, -4, 5),
    (-1, 2, -9, 2), (5, 0, 10, 3), (6, 6, 0, 1), (10, 5, 7, -9),
    (4, 1, -9, -2), (3, 7, 3, 2), (7, -12, -5, -3), (-3, 6, -1, -12),
    (-6, -9, -2, 1), (3, 1, -7, 6), (9, 9, 2, -10), (1, -4, 3, 6),
    (7, -3, 7, -4), (-9, 3, 2, 9), (-2, -4, 3, -10), (8, -2, -6, 12),
    (-3, -3, -4, -9), (-6, -3, 0, -4), (5, 2, -9, 9), (9, -3, 3, -1),
    (0, -2, 3, 7), (-5, 6, -5, 0), (9, 6, 0, -8), (6, 0, -6, 7),
    (3, 4, -4, -2), (1, -4, -1, 7), (2, 1, 12, 6), (0, -6, 4, 12),
    (-1, 13, -6, 7), (-9, 5, 1, 0), (-5, -10, 4, 4), (-11, 7, 13, 12),
    (5, -2, 5, 3), (-4, -4, 0, 4), (-3, -4, 1, -6), (-5, 0, -2, 1),
    (-5, -3, -4, -7), (3, -8, 6, 3), (-5, -2, 3, 2), (10, 1, 10, 13),
    (6, 4, -6, -7), (7, 2, 4, -5), (5, -3, 7, 2), (-2, 3, 0, 1),
    (0, 3, 8, -5), (2, 8, 3, -12), (-7, 7, -3, -12), (10, 10, -11, -2),
    (-1, 10, 2, -5), (4, 7, 0, -6), (2, 5, 9, 4), (0, -6, 9, 2),
    (1, 2, -9, 9), (-12, -12, -1, 1), (-2, -3, -1, 5), (-6, 2, -2, 2),
    (-4, 4, -1, 0), (0, -1, 1, 3), (3, -8, -9, 9), (-6, -1, 10, 11),
    (1, -2, 6, -4), (0, 4, 1, 3), (4, -3, -5, -7), (5, 6, 7, 6),
    (4, 3, 3, 6), (-8, 4, 8, -1), (2, 4, -4, 2), (10, 3, 11, -8),
    (5, 5, -3, -5), (5, -7, -2, 1), (-5, 3, -1, -4), (2, 5, 4, 0),
    (3, 8, -2, -1), (1, 5, 6, 4), (-3, 4, -2, -1), (-2, -3, 4, 2),
    (2, -7, -10, 3), (-7, 0, -5, 3), (-7, -1, -11, 0), (-7, -9, -8, 7),
    (-4, 1, 2, -5), (13, 10, 2, -3), (3, 8, 1, -1), (2, 6, -1, 4),
    (-3, 2, -4, -5), (-3, -7, -1, 10), (3, 8, -8, 4), (5, -12, 2, -9),
    (13, 7, -2, -7), (9, 5, -3, -8), (-3, -1, 6, 4), (4, 8, 1, -5),
    (2, 0, -1, 3), (10, -11, -6, -5), (-2, -5, 7, 4), (2, -3, -1, 10),
    (-3, -6, -8, 4), (2, 3, -4, -6), (2, -2, -13, 8), (3, 0, -2, -1),
    (-2, -5, 1, 3), (-2, -8, -10, -2), (-3, 4, 2, -5), (4, -6, -4, 11),
    (1, -8, -1, -5), (-5, 6, 5, 2), (2, 7, -10, 0), (7, 11, 0, 0),
    (1, 1, 9, 1), (-1, -3, -2, 5), (2, 0, -1, -8), (9, -12, -8, -3),
    (-5, -4, 1, -3), (10, -3, 9, 0), (0, -1, -11, 2), (10, -10, -1, 8),
    (-9, 9, -7, -9), (-8, -6, -7, -3), (0, -6, 2, -10), (-12, -1, 8, 1),
    (-6, -9, -11, -6), (-3, 2, -7, 2), (2, 5, -5, -4), (4, 3, 1, -7),
    (4, -2, -7, -5), (0, -8, 6, 3), (3, -5, 1, -6), (2, -8, -13, -2),
    (-5, -4, 2, -8), (0, -2, -2, 2), (2, 2, 3, 11), (-5, 2, 0, 1),
    (5, 6, 7, 2), (-3, -3, 2, -3), (-5, 9, 4, -2), (-7, 2, -6, 6),
    (-7, -5, 6, -13), (-10, 4, -2, 7), (8, 9, 3, -2), (7, -3, 3, -4),
    (-3, 6, 2, -7), (-1, 7, 5, -2), (-2, 1, 1, -3), (-3, 8, 6, -5),
];
