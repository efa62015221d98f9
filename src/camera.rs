use crate::Coord;
use crate::world::World;

/// Hex values of braille dots
///
/// ```text
///      1   8
///      2  10
///      4  20
///     40  80
/// ```
///
/// Where the base blank pattern is codepoint `0x2800` (or U+2800)
///
/// To get other configurations, just add the numbers above.
const BRAILLE_EMPTY: u32 = 0x2800;

/// A window onto a [`World`], one cell per screen pixel, drawn with braille characters.
pub struct Camera {
    /// The cell buffer
    cb: Vec<bool>,

    /// The frame buffer.
    fb: String,

    /// Codepoints. This allows us to construct the framebuffer more easily
    cp: Vec<u32>,

    /// Width of the cell buffer
    w: usize,

    /// Height of the cell buffer
    h: usize,

    /// World coordinate of the top left pixel
    x: Coord,
    y: Coord,
}

impl Camera {
    /// A camera of `w` by `h` cells, with its top left corner on `(x, y)`.
    pub fn new(w: usize, h: usize, x: Coord, y: Coord) -> Self {
        // Let `w` and `h` refer to width and height of the cell buffer. Then `bw = ceil(w / 2)`
        // and `bh = ceil(h / 4)` are the width and height of braille characters of our framebuffer
        // (that is, not accounting for the trailing newlines expected at the end of each line).
        let (bw, bh) = (w.div_ceil(2), h.div_ceil(4));

        // Each braille character is 3 bytes, and newlines one byte. Since we need `bh` newlines,
        // this gives us a framebuffer of length `3 * (bw * bh) + bh`.
        let fb = String::with_capacity(3 * (bw * bh) + bh);

        Self {
            cb: vec![false; w * h],
            fb,
            cp: vec![BRAILLE_EMPTY; bw * bh],
            w,
            h,
            x,
            y,
        }
    }

    /// A camera of `w` by `h` cells centred on the origin
    pub fn centred(w: usize, h: usize) -> Self {
        Self::new(w, h, -(w as Coord) / 2, -(h as Coord) / 2)
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn offset_x(&mut self, offset: Coord) {
        self.x += offset;
    }

    pub fn offset_y(&mut self, offset: Coord) {
        self.y += offset;
    }

    /// Turns on a single pixel of the framebuffer
    pub fn draw_pixel(&mut self, x: usize, y: usize) {
        assert!(x < self.w, "x is out of bounds");
        assert!(y < self.h, "y is out of bounds");

        let i = self.xy_from(x, y);

        self.cb[i] = true;
    }

    /// Reset the cell buffer
    pub fn reset(&mut self) {
        self.cb.fill(false);
    }

    /// Fill the cell buffer with what the world looks like under the camera.
    pub fn draw_world(&mut self, world: &World) {
        self.reset();

        for n in 0..self.cb.len() {
            let (x, y) = self.xy_to(n);

            if world.get(self.x + x as Coord, self.y + y as Coord) {
                self.cb[n] = true;
            }
        }
    }

    /// Fundamentally, we have a framebuffer of every pixel on our screen, and we ask ourselves "Is
    /// this pixel on or off?".
    pub fn render(&mut self) -> &str {
        let bw = self.w.div_ceil(2);

        // compute new codepoints
        self.cp.fill(BRAILLE_EMPTY);

        for (n, &px) in self.cb.iter().enumerate() {
            let (x, y) = self.xy_to(n);
            let hex = Self::get_hex_value(x, y);

            if px {
                self.cp[(y / 4) * bw + (x / 2)] += hex;
            }
        }

        // update framebuffer
        self.fb.clear();

        for (i, &c) in self.cp.iter().enumerate() {
            if i > 0 && i % bw == 0 {
                self.fb.push('\n');
            }

            // Every sum of dots stays within U+2800..=U+28FF
            self.fb.push(char::from_u32(c).unwrap_or(' '));
        }
        self.fb.push('\n');

        &self.fb
    }

    /// The cell buffer as rows of `#` (alive) and `.` (dead).
    pub fn render_ascii(&self) -> String {
        self.cb
            .chunks(self.w.max(1))
            .map(|row| row.iter().map(|&px| if px { '#' } else { '.' }).collect())
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn xy_to(&self, n: usize) -> (usize, usize) {
        (n % self.w, n / self.w)
    }

    fn xy_from(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    fn get_hex_value(x: usize, y: usize) -> u32 {
        match (x % 2, y % 4) {
            (0, 0) => 0x1,
            (1, 0) => 0x8,
            (0, 1) => 0x2,
            (1, 1) => 0x10,
            (0, 2) => 0x4,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn braille_dots() {
        let mut cam = Camera::new(4, 4, 0, 0);

        cam.draw_pixel(0, 0);
        cam.draw_pixel(1, 3);
        cam.draw_pixel(3, 1);

        // 0x2800 + 0x1 + 0x80, then 0x2800 + 0x10
        assert_eq!(cam.render(), "\u{2881}\u{2810}\n");
    }

    #[test]
    fn odd_sizes_round_up() {
        let mut cam = Camera::new(3, 5, 0, 0);

        assert_eq!(cam.render(), "\u{2800}\u{2800}\n\u{2800}\u{2800}\n");
    }

    #[test]
    fn draws_the_world() {
        let mut world = World::with_depth(4).unwrap();

        for (x, y) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            world.set(x, y).unwrap();
        }

        let mut cam = Camera::new(5, 4, -1, -1);
        cam.draw_world(&world);

        insta::assert_snapshot!(cam.render_ascii(), @r"
        .....
        ..#..
        ...#.
        .###.
        ");

        cam.offset_x(1);
        cam.offset_y(1);
        cam.draw_world(&world);

        insta::assert_snapshot!(cam.render_ascii(), @r"
        .#...
        ..#..
        ###..
        .....
        ");
    }
}
