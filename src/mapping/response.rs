//! Achskennlinie: Totzone, kubische Kurve und Zeitskalierung
//!
//! Eine Auslenkung verändert die Zielgröße kontinuierlich ("Geschwindigkeit"
//! statt absoluter Position). Der Betrag pro Frame ist
//! `kurve(auslenkung) * rate * dt`.

/// Ruhelage einer Rohachse
pub const AXIS_CENTER: f32 = 0.5;

/// Exponent der Antwortkurve
pub const CURVE_EXPONENT: i32 = 3;

/// Lineare Abbildung von `[in_min, in_max]` auf `[out_min, out_max]`
pub fn normalize(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let range = in_max - in_min;
    if range == 0.0 {
        return out_min;
    }
    out_min + (value - in_min) / range * (out_max - out_min)
}

/// Vorzeichenbehaftete Auslenkung in [-1, 1] hinter der Totzone
///
/// Werte innerhalb `[0.5 - nullzone, 0.5 + nullzone]` ergeben 0. Das
/// Vorzeichen folgt der Rohachse (positiv oberhalb der Mitte).
pub fn deflection(raw: f32, nullzone: f32) -> f32 {
    let nullzone = nullzone.clamp(0.0, AXIS_CENTER - f32::EPSILON);
    let offset = raw - AXIS_CENTER;
    let magnitude = offset.abs();
    if magnitude <= nullzone {
        return 0.0;
    }
    let scaled = normalize(magnitude, nullzone, AXIS_CENTER, 0.0, 1.0).clamp(0.0, 1.0);
    scaled.copysign(offset)
}

/// Kubische Antwortkurve für einen Betrag in [0, 1]
pub fn response_curve(magnitude: f32, out_min: f32, out_max: f32) -> f32 {
    let percent = normalize(magnitude.clamp(0.0, 1.0), 0.0, 1.0, 0.0, 100.0);
    let full_scale = 100f32.powi(CURVE_EXPONENT);
    normalize(percent.powi(CURVE_EXPONENT), 0.0, full_scale, out_min, out_max)
}

/// Änderung der Zielgröße für diesen Frame
pub fn axis_delta(raw: f32, nullzone: f32, rate: f32, dt: f32) -> f32 {
    let d = deflection(raw, nullzone);
    if d == 0.0 {
        return 0.0;
    }
    response_curve(d.abs(), 0.0, 1.0).copysign(d) * rate * dt
}

/// Anzahl Wiederholungen eines diskreten Schwenk-Kommandos für eine
/// Auslenkung `d` in [0, 1]
pub fn pan_repeats(d: f32) -> u32 {
    (2.0 * d.abs().min(1.0)).powi(2).round() as u32
}

/// Begrenzung auf [0, 1]
pub fn clamp_ratio(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Speedbrake-Wert: [0, 1] oder der Armed-Wert -0.5
pub fn clamp_speedbrake(value: f32) -> f32 {
    if value == SPEEDBRAKE_ARMED {
        value
    } else {
        clamp_ratio(value)
    }
}

pub const SPEEDBRAKE_ARMED: f32 = -0.5;
