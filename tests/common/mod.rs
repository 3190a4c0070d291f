//! Synthetic state × crop × year tables shared by the integration tests

use polars::prelude::*;

pub const STATES: [&str; 3] = ["Punjab", "Kerala", "Bihar"];
pub const CROPS: [&str; 2] = ["Rice", "Wheat"];

/// Deterministic merged table: every (state, crop) pair observed for `years` years
///
/// Rows are emitted year-major so systems are interleaved, and the last state
/// observes wheat for two years only.
pub fn merged_frame(years: i32) -> DataFrame {
    let mut state = Vec::new();
    let mut crop = Vec::new();
    let mut year = Vec::new();
    let mut crop_yield = Vec::new();
    let mut n = Vec::new();
    let mut p = Vec::new();
    let mut k = Vec::new();
    let mut n_req = Vec::new();
    let mut p_req = Vec::new();
    let mut k_req = Vec::new();
    let mut temperature = Vec::new();
    let mut rainfall = Vec::new();
    let mut humidity = Vec::new();

    for y in 0..years {
        for (si, &s) in STATES.iter().enumerate() {
            for (ci, &c) in CROPS.iter().enumerate() {
                if si == 2 && ci == 1 && y >= 2 {
                    continue;
                }
                let seed = (y * 7 + si as i32 * 13 + ci as i32 * 29) % 17;
                state.push(s);
                crop.push(c);
                year.push(2000 + y);
                crop_yield.push(1500.0 + 90.0 * seed as f64 - 40.0 * si as f64);
                n.push(80.0 + seed as f64);
                p.push(35.0 + (seed % 5) as f64);
                k.push(45.0 + (seed % 7) as f64);
                n_req.push(100.0 + 10.0 * ci as f64);
                p_req.push(40.0);
                k_req.push(50.0);
                temperature.push(22.0 + 0.4 * seed as f64 + si as f64);
                rainfall.push(900.0 - 25.0 * seed as f64 + 100.0 * ci as f64);
                humidity.push(70.0 + (seed % 9) as f64);
            }
        }
    }

    df![
        "state" => state,
        "crop" => crop,
        "year" => year,
        "yield" => crop_yield,
        "n" => n,
        "p" => p,
        "k" => k,
        "n_req_kg_per_ha" => n_req,
        "p_req_kg_per_ha" => p_req,
        "k_req_kg_per_ha" => k_req,
        "temperature_nasa" => temperature,
        "rainfall_nasa" => rainfall,
        "humidity_nasa" => humidity,
    ]
    .unwrap()
}

pub fn rules_frame() -> DataFrame {
    df![
        "crop" => &["rice", "rice", "wheat"],
        "disease" => &["rice blast", "sheath blight", "wheat rust"],
        "temp_min" => &[20.0, 24.0, 15.0],
        "temp_max" => &[28.0, 32.0, 25.0],
        "humidity_min" => &[72.0, 75.0, 70.0],
        "rainfall_min" => &[600.0, 700.0, 500.0],
    ]
    .unwrap()
}
