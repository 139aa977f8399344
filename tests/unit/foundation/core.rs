use super::*;

#[test]
fn transform_to_affine_identity_and_translation() {
    let t = Transform2D::default();
    assert_eq!(t.to_affine(), Affine::IDENTITY);

    let t = Transform2D {
        translate: Vec2::new(10.0, -2.5),
        ..Transform2D::default()
    };
    assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
}

#[test]
fn transform_scales_before_translating() {
    let t = Transform2D::new(Vec2::new(100.0, 50.0), 0.0, 2.0);
    let p = t.to_affine() * Point::new(3.0, 4.0);
    assert_eq!(p, Point::new(106.0, 58.0));
}

#[test]
fn rotation_pivots_on_origin() {
    let t = Transform2D::new(Vec2::ZERO, std::f64::consts::FRAC_PI_2, 1.0);
    let p = t.to_affine() * Point::new(1.0, 0.0);
    assert!((p.x - 0.0).abs() < 1e-9);
    assert!((p.y - 1.0).abs() < 1e-9);
}

#[test]
fn zero_scale_has_no_inverse() {
    let t = Transform2D::new(Vec2::new(5.0, 5.0), 0.0, 0.0);
    assert!(invert_affine(t.to_affine()).is_none());
    let t = Transform2D::new(Vec2::new(5.0, 5.0), 0.3, 2.0);
    let inv = invert_affine(t.to_affine()).unwrap();
    let p = inv * (t.to_affine() * Point::new(7.0, -1.0));
    assert!((p.x - 7.0).abs() < 1e-9);
    assert!((p.y + 1.0).abs() < 1e-9);
}

#[test]
fn colors_default_to_transparent() {
    assert!(Rgba8::default().is_transparent());
    assert!(!Rgba8::opaque(1, 2, 3).is_transparent());
}
