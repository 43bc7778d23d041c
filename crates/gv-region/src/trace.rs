use gv_core::{
    GridView, LatticeRing, PixelPoint, RegionPolygon, lattice_ring_contains, signed_area2_lattice,
};

use crate::components::{Components, label_components};

// Direction codes over lattice vertices: E, S, W, N.
const DX: [i64; 4] = [1, 0, -1, 0];
const DY: [i64; 4] = [0, 1, 0, -1];

#[inline]
fn rot_left(dir: u8) -> u8 {
    (dir + 3) & 3
}

#[inline]
fn rot_right(dir: u8) -> u8 {
    (dir + 1) & 3
}

/// Extract one polygon (shell + holes) per 4-connected region of the view.
///
/// `origin` is the global lattice position of the view's top-left pixel
/// corner; emitted rings are in global lattice coordinates so that rings of
/// neighboring tiles share exact vertices along seams.
pub fn extract_region_polygons(
    view: &GridView<'_, i32>,
    nodata: Option<i32>,
    origin: PixelPoint,
) -> Vec<RegionPolygon> {
    let comps = label_components(view, nodata);
    let rings = trace_rings(&comps, origin);
    assemble_polygons(&comps, rings)
}

struct Tracer<'c> {
    comps: &'c Components,
    origin: PixelPoint,
    vw: usize,
    used: Vec<u8>,
}

impl<'c> Tracer<'c> {
    fn new(comps: &'c Components, origin: PixelPoint) -> Self {
        let vw = comps.width + 1;
        let vh = comps.height + 1;
        Self {
            comps,
            origin,
            vw,
            used: vec![0; vw * vh],
        }
    }

    /// Component owning the directed edge `(vx, vy, dir)`: the pixel on the
    /// right of travel.
    #[inline]
    fn owner(&self, vx: i64, vy: i64, dir: u8) -> Option<usize> {
        let (px, py) = match dir {
            0 => (vx, vy),
            1 => (vx - 1, vy),
            2 => (vx - 1, vy - 1),
            _ => (vx, vy - 1),
        };
        self.pixel_comp(px, py)
    }

    /// Component of the pixel on the left of travel (the non-owning side).
    #[inline]
    fn left_side(&self, vx: i64, vy: i64, dir: u8) -> Option<usize> {
        let (px, py) = match dir {
            0 => (vx, vy - 1),
            1 => (vx, vy),
            2 => (vx - 1, vy),
            _ => (vx - 1, vy - 1),
        };
        self.pixel_comp(px, py)
    }

    #[inline]
    fn pixel_comp(&self, px: i64, py: i64) -> Option<usize> {
        if px < 0 || py < 0 {
            return None;
        }
        self.comps.id_at(px as usize, py as usize)
    }

    /// A boundary edge of `comp` exists at `(vx, vy, dir)` iff `comp` owns
    /// the right side and anything else (another region, nodata, or the view
    /// exterior) lies on the left.
    #[inline]
    fn edge_exists(&self, vx: i64, vy: i64, dir: u8, comp: usize) -> bool {
        self.owner(vx, vy, dir) == Some(comp) && self.left_side(vx, vy, dir) != Some(comp)
    }

    #[inline]
    fn is_used(&self, vx: i64, vy: i64, dir: u8) -> bool {
        self.used[vy as usize * self.vw + vx as usize] & (1 << dir) != 0
    }

    #[inline]
    fn mark_used(&mut self, vx: i64, vy: i64, dir: u8) {
        self.used[vy as usize * self.vw + vx as usize] |= 1 << dir;
    }

    #[inline]
    fn global(&self, vx: i64, vy: i64) -> PixelPoint {
        PixelPoint::new(self.origin.x + vx, self.origin.y + vy)
    }

    /// Follow one closed boundary loop. Pinch vertices offer two unused
    /// outgoing edges; preferring the left turn keeps diagonal same-label
    /// pixels in separate rings, so every returned ring is simple.
    fn trace_ring(&mut self, start_x: i64, start_y: i64, start_dir: u8, comp: usize) -> LatticeRing {
        let mut ring = vec![self.global(start_x, start_y)];
        let (mut vx, mut vy, mut dir) = (start_x, start_y, start_dir);

        let max_steps = 4 * self.used.len();
        for _ in 0..max_steps {
            self.mark_used(vx, vy, dir);
            vx += DX[dir as usize];
            vy += DY[dir as usize];

            if vx == start_x && vy == start_y {
                ring.push(self.global(vx, vy));
                return ring;
            }
            ring.push(self.global(vx, vy));

            let mut next = None;
            for cand in [rot_left(dir), dir, rot_right(dir)] {
                if self.edge_exists(vx, vy, cand, comp) && !self.is_used(vx, vy, cand) {
                    next = Some(cand);
                    break;
                }
            }

            match next {
                Some(nd) => dir = nd,
                None => break,
            }
        }

        debug_assert!(false, "boundary loop did not close");
        ring
    }
}

fn trace_rings(comps: &Components, origin: PixelPoint) -> Vec<(usize, LatticeRing)> {
    let mut tracer = Tracer::new(comps, origin);
    let mut rings = Vec::new();

    for vy in 0..=comps.height as i64 {
        for vx in 0..=comps.width as i64 {
            for dir in 0..4u8 {
                if tracer.is_used(vx, vy, dir) {
                    continue;
                }
                let Some(comp) = tracer.owner(vx, vy, dir) else {
                    continue;
                };
                if tracer.left_side(vx, vy, dir) == Some(comp) {
                    continue;
                }

                let ring = tracer.trace_ring(vx, vy, dir, comp);
                rings.push((comp, ring));
            }
        }
    }

    rings
}

/// Group traced rings into polygons: positive-area rings are shells,
/// negative-area rings are holes nested into the smallest containing shell
/// of the same component.
fn assemble_polygons(comps: &Components, rings: Vec<(usize, LatticeRing)>) -> Vec<RegionPolygon> {
    // (comp, shell ring, area2) in discovery order, plus per-comp hole lists.
    let mut shells: Vec<(usize, LatticeRing, i128)> = Vec::new();
    let mut holes: Vec<(usize, LatticeRing)> = Vec::new();

    for (comp, ring) in rings {
        let area2 = signed_area2_lattice(&ring);
        if area2 > 0 {
            shells.push((comp, ring, area2));
        } else {
            holes.push((comp, ring));
        }
    }

    let mut polygons: Vec<RegionPolygon> = shells
        .iter()
        .map(|(comp, ring, _)| RegionPolygon {
            label: comps.labels[*comp],
            shell: ring.clone(),
            holes: Vec::new(),
        })
        .collect();

    for (comp, hole) in holes {
        let probe2 = vertical_edge_probe(&hole);
        let mut best: Option<(usize, i128)> = None;

        for (i, (shell_comp, shell, area2)) in shells.iter().enumerate() {
            if *shell_comp != comp {
                continue;
            }
            if !lattice_ring_contains(shell, probe2) {
                continue;
            }
            if best.is_none_or(|(_, a)| *area2 < a) {
                best = Some((i, *area2));
            }
        }

        match best {
            Some((i, _)) => polygons[i].holes.push(hole),
            // A hole without a containing shell cannot arise from a
            // 4-connected component; keep going rather than lose coverage.
            None => debug_assert!(false, "hole ring without containing shell"),
        }
    }

    polygons
}

/// Probe point for containment tests, in doubled coordinates: the midpoint
/// of the ring's first vertical edge. Every closed lattice ring has one.
fn vertical_edge_probe(ring: &[PixelPoint]) -> (i64, i64) {
    for w in ring.windows(2) {
        if w[0].x == w[1].x {
            return (2 * w[0].x, w[0].y + w[1].y);
        }
    }
    unreachable!("closed lattice ring must contain a vertical edge")
}
