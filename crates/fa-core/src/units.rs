// fa-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, Force as UomForce, Length as UomLength, Pressure as UomPressure,
    Torque as UomTorque,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Force = UomForce;
pub type Length = UomLength;
pub type Pressure = UomPressure;
pub type Torque = UomTorque;

#[inline]
pub fn n(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn nm(v: f64) -> Torque {
    use uom::si::torque::newton_meter;
    Torque::new::<newton_meter>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn mpa(v: f64) -> Pressure {
    use uom::si::pressure::megapascal;
    Pressure::new::<megapascal>(v)
}

#[inline]
pub fn as_newtons(f: Force) -> f64 {
    use uom::si::force::newton;
    f.get::<newton>()
}

#[inline]
pub fn as_newton_meters(t: Torque) -> f64 {
    use uom::si::torque::newton_meter;
    t.get::<newton_meter>()
}

#[inline]
pub fn as_meters(l: Length) -> f64 {
    use uom::si::length::meter;
    l.get::<meter>()
}

/// Axial force of a hydraulic cylinder: pressure acting on the piston area.
#[inline]
pub fn piston_force(pressure: Pressure, area: Area) -> Force {
    use uom::si::area::square_meter;
    use uom::si::pressure::pascal;
    n(pressure.get::<pascal>() * area.get::<square_meter>())
}
