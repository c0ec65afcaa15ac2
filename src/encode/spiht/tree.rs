// src/encode/spiht/tree.rs

//! Spatial-orientation tree over a Mallat pyramid, computed from coordinates.
//!
//! With a `W x H` plane decomposed `N` times the root band is the top-left
//! `(W >> N) x (H >> N)` region. A root coefficient `(x, y)` has three children,
//! one per orientation of the coarsest detail level: `(x + rw, y)`,
//! `(x, y + rh)` and `(x + rw, y + rh)`. Every other coefficient in the top-left
//! `W/2 x H/2` quadrant has the four children `(2x, 2y)`, `(2x + 1, 2y)`,
//! `(2x, 2y + 1)`, `(2x + 1, 2y + 1)`; coefficients of the finest detail bands
//! are leaves.

pub type Coord = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialTree {
    width: usize,
    height: usize,
    root_width: usize,
    root_height: usize,
    num_stages: u32,
}

/// Up to four child coordinates, in coding order.
#[derive(Debug, Clone, Copy)]
pub struct Children {
    coords: [Coord; 4],
    len: usize,
    next: usize,
}

impl Children {
    fn none() -> Self {
        Children {
            coords: [(0, 0); 4],
            len: 0,
            next: 0,
        }
    }

    fn of(coords: &[Coord]) -> Self {
        let mut children = Self::none();
        children.coords[..coords.len()].copy_from_slice(coords);
        children.len = coords.len();
        children
    }
}

impl Iterator for Children {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if self.next < self.len {
            self.next += 1;
            Some(self.coords[self.next - 1])
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Children {}

impl SpatialTree {
    /// `width` and `height` are the padded plane dimensions.
    pub fn new(width: usize, height: usize, num_stages: u32) -> Self {
        let block = 1usize << num_stages;
        assert!(
            width >= block && height >= block && width % block == 0 && height % block == 0,
            "{}x{} plane cannot hold {} stages",
            width,
            height,
            num_stages
        );
        SpatialTree {
            width,
            height,
            root_width: width >> num_stages,
            root_height: height >> num_stages,
            num_stages,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn root_size(&self) -> (usize, usize) {
        (self.root_width, self.root_height)
    }

    #[inline]
    pub fn index(&self, (x, y): Coord) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn is_root(&self, (x, y): Coord) -> bool {
        x < self.root_width && y < self.root_height
    }

    /// Root band coordinates in row-major order.
    pub fn root_band(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.root_height).flat_map(move |y| (0..self.root_width).map(move |x| (x, y)))
    }

    pub fn children(&self, (x, y): Coord) -> Children {
        let (rw, rh) = (self.root_width, self.root_height);
        if self.is_root((x, y)) {
            if self.num_stages == 0 {
                return Children::none();
            }
            return Children::of(&[(x + rw, y), (x, y + rh), (x + rw, y + rh)]);
        }
        if x < self.width / 2 && y < self.height / 2 {
            let (cx, cy) = (2 * x, 2 * y);
            return Children::of(&[(cx, cy), (cx + 1, cy), (cx, cy + 1), (cx + 1, cy + 1)]);
        }
        Children::none()
    }

    pub fn parent(&self, (x, y): Coord) -> Option<Coord> {
        let (rw, rh) = (self.root_width, self.root_height);
        if self.is_root((x, y)) {
            return None;
        }
        if x < 2 * rw && y < 2 * rh {
            let px = if x >= rw { x - rw } else { x };
            let py = if y >= rh { y - rh } else { y };
            return Some((px, py));
        }
        Some((x / 2, y / 2))
    }

    #[inline]
    pub fn has_descendants(&self, coord: Coord) -> bool {
        self.children(coord).len() > 0
    }

    pub fn has_grandchildren(&self, coord: Coord) -> bool {
        self.children(coord).any(|c| self.has_descendants(c))
    }
}
