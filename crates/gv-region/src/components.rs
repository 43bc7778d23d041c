use gv_core::GridView;

const NO_COMPONENT: i32 = -1;

/// Per-pixel component ids for one grid view.
///
/// `comp_at` is row-major over the view; nodata pixels carry `-1`.
/// Component ids are assigned in row-major order of each component's first
/// pixel, so labeling is deterministic.
#[derive(Debug, Clone)]
pub struct Components {
    pub width: usize,
    pub height: usize,
    pub comp_at: Vec<i32>,
    pub labels: Vec<i32>,
    pub sizes: Vec<usize>,
}

impl Components {
    #[inline]
    pub fn id_at(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let id = self.comp_at[y * self.width + x];
        (id >= 0).then_some(id as usize)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// 4-connected component labeling per label value.
pub fn label_components(view: &GridView<'_, i32>, nodata: Option<i32>) -> Components {
    let (w, h) = (view.width(), view.height());
    let n = w * h;

    let mut comp_at = vec![NO_COMPONENT; n];
    let mut labels = Vec::new();
    let mut sizes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..n {
        if comp_at[start] != NO_COMPONENT {
            continue;
        }

        let (sx, sy) = (start % w, start / w);
        let label = *view.get(sx, sy).expect("pixel in view bounds");
        if nodata == Some(label) {
            continue;
        }

        let id = labels.len() as i32;
        labels.push(label);
        sizes.push(0);

        comp_at[start] = id;
        stack.clear();
        stack.push(start);

        while let Some(p) = stack.pop() {
            sizes[id as usize] += 1;
            let (x, y) = (p % w, p / w);

            let mut visit = |nx: usize, ny: usize| {
                let np = ny * w + nx;
                if comp_at[np] == NO_COMPONENT
                    && *view.get(nx, ny).expect("neighbor in view bounds") == label
                {
                    comp_at[np] = id;
                    stack.push(np);
                }
            };

            if x > 0 {
                visit(x - 1, y);
            }
            if x + 1 < w {
                visit(x + 1, y);
            }
            if y > 0 {
                visit(x, y - 1);
            }
            if y + 1 < h {
                visit(x, y + 1);
            }
        }
    }

    Components {
        width: w,
        height: h,
        comp_at,
        labels,
        sizes,
    }
}
