use ledmatrix::{ColorGrid, DisplaySurface, LedShape, MatrixConfig, MatrixRenderer, Rgb};

fn settings(canvas_size: u32, matrix_size: u32, led_shape: LedShape) -> MatrixConfig {
    MatrixConfig {
        canvas_size,
        matrix_size,
        led_shape,
        ..Default::default()
    }
}

/// Grille où chaque cellule a une couleur unique
fn distinct_grid(n: usize) -> ColorGrid {
    let mut cells = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            cells.push(Rgb::new(10 + (x * 20) as u8, 10 + (y * 20) as u8, 200));
        }
    }
    ColorGrid::from_cells(n, cells).unwrap()
}

/// Vérifie que chaque pixel peint tombe dans la cellule de sa couleur
/// et que les N² cellules ont toutes été dessinées
fn assert_cells_confined(renderer: &MatrixRenderer, grid: &ColorGrid, surface: &DisplaySurface) {
    let n = grid.size();
    let cell = renderer.cell_size();
    let mut painted = vec![0usize; n * n];

    for py in 0..surface.size() {
        for px in 0..surface.size() {
            let color = surface.pixel(px, py);
            if color == Rgb::BLACK {
                continue;
            }
            let cx = ((px as f64 + 0.5) / cell).floor() as usize;
            let cy = ((py as f64 + 0.5) / cell).floor() as usize;
            assert!(cx < n && cy < n, "pixel ({px}, {py}) outside the matrix");
            assert_eq!(
                color,
                grid.get(cx, cy),
                "pixel ({px}, {py}) bleeds into cell ({cx}, {cy})"
            );
            painted[cy * n + cx] += 1;
        }
    }

    for (i, count) in painted.iter().enumerate() {
        assert!(*count > 0, "cell ({}, {}) was not drawn", i % n, i / n);
    }
}

#[test]
fn test_two_by_two_red_squares() {
    let renderer = MatrixRenderer::new(&settings(10, 2, LedShape::Square));
    let mut surface = DisplaySurface::new(10);
    let grid = ColorGrid::filled(2, Rgb::new(255, 0, 0));

    renderer.render(&grid, &mut surface).unwrap();

    // Cellules de 5px, carrés de 3px décalés de 1px
    for y in 0..10 {
        for x in 0..10 {
            let inside = (1..=3).contains(&(x % 5)) && (1..=3).contains(&(y % 5));
            let expected = if inside {
                Rgb::new(255, 0, 0)
            } else {
                Rgb::BLACK
            };
            assert_eq!(surface.pixel(x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_square_cells_stay_in_footprint() {
    let renderer = MatrixRenderer::new(&settings(40, 4, LedShape::Square));
    let mut surface = DisplaySurface::new(40);
    let grid = distinct_grid(4);

    renderer.render(&grid, &mut surface).unwrap();
    assert_cells_confined(&renderer, &grid, &surface);
}

#[test]
fn test_circle_cells_stay_in_footprint() {
    let renderer = MatrixRenderer::new(&settings(64, 8, LedShape::Circle));
    let mut surface = DisplaySurface::new(64);
    let grid = distinct_grid(8);

    renderer.render(&grid, &mut surface).unwrap();
    assert_cells_confined(&renderer, &grid, &surface);

    // Les coins d'une cellule restent noirs en mode cercle
    assert_eq!(surface.pixel(0, 0), Rgb::BLACK);
    assert_eq!(surface.pixel(7, 7), Rgb::BLACK);
    // Le centre est peint
    assert_eq!(surface.pixel(4, 4), grid.get(0, 0));
}

#[test]
fn test_fractional_cell_size() {
    // 50 / 3 n'est pas entier: les cellules restent disjointes
    let renderer = MatrixRenderer::new(&settings(50, 3, LedShape::Square));
    let mut surface = DisplaySurface::new(50);
    let grid = distinct_grid(3);

    renderer.render(&grid, &mut surface).unwrap();
    assert_cells_confined(&renderer, &grid, &surface);
}

#[test]
fn test_render_replaces_previous_frame() {
    let renderer = MatrixRenderer::new(&settings(10, 2, LedShape::Square));
    let mut surface = DisplaySurface::new(10);

    renderer
        .render(&ColorGrid::filled(2, Rgb::new(255, 255, 255)), &mut surface)
        .unwrap();
    renderer
        .render(&ColorGrid::filled(2, Rgb::new(0, 0, 255)), &mut surface)
        .unwrap();

    assert_eq!(surface.pixel(2, 2), Rgb::new(0, 0, 255));
    assert_eq!(surface.pixel(0, 0), Rgb::BLACK);
}

#[test]
fn test_default_geometry() {
    let renderer = MatrixRenderer::new(&MatrixConfig::default());
    assert!((renderer.cell_size() - 18.75).abs() < 1e-9);
    assert_eq!(renderer.cell_origin(2, 3), (37.5, 56.25));
    assert_eq!(renderer.shape(), LedShape::Circle);
}
