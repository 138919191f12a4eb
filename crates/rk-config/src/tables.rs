//! MIL-HDBK-217F lookup tables consumed by the hazard-rate models.
//!
//! Every table is plain data with a built-in default and can be replaced
//! wholesale from the configuration file. Environment-indexed rows always
//! have one entry per active environment (14), addressed as
//! `environment_id - 1`.
//!
//! Rates are in failures per 10⁶ hours.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of operating environments in every environment-indexed row.
pub const ENVIRONMENT_COUNT: usize = 14;

/// All handbook tables, one block per component category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HandbookTables {
    pub capacitor: CapacitorTables,
    pub connection: ConnectionTables,
    pub relay: RelayTables,
    pub meter: MeterTables,
    pub optoelectronic: OptoelectronicTables,
}

fn rows(data: &[&[f64]]) -> Vec<Vec<f64>> {
    data.iter().map(|r| r.to_vec()).collect()
}

fn keyed<T: Clone>(data: &[(u32, T)]) -> BTreeMap<u32, T> {
    data.iter().cloned().collect()
}

// ============================================================================
// Capacitors (MIL-HDBK-217F section 10)
// ============================================================================

/// Capacitor tables, keyed by subcategory (1-19).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacitorTables {
    /// Parts-count base rates; one row per specification where the
    /// subcategory distinguishes them.
    pub part_count_lambda_b: BTreeMap<u32, Vec<Vec<f64>>>,
    /// Parts-count quality factors by quality id.
    pub part_count_pi_q: Vec<f64>,
    /// Part-stress quality factors by subcategory and quality id.
    pub part_stress_pi_q: BTreeMap<u32, Vec<f64>>,
    /// Environment factors.
    pub pi_e: Vec<f64>,
    /// Construction factors for solid tantalum (subcategory 13).
    pub pi_c: BTreeMap<u32, f64>,
    /// Configuration factors for variable air trimmers (subcategory 19).
    pub pi_cf: BTreeMap<u32, f64>,
    /// Reference temperature (K) keyed by rated maximum temperature (°C).
    pub reference_temperatures: BTreeMap<u32, f64>,
    /// `piCV = f0 * C^f1` coefficients.
    pub capacitance_factors: BTreeMap<u32, [f64; 2]>,
    /// `lambda_b = f0 * ((S/f1)^f2 + 1) * exp(f3 * (T/Tref)^f4)` coefficients.
    pub lambda_b_factors: BTreeMap<u32, [f64; 5]>,
}

impl Default for CapacitorTables {
    fn default() -> Self {
        Self {
            part_count_lambda_b: keyed(&[
                (
                    1,
                    rows(&[
                        &[0.0036, 0.0072, 0.330, 0.016, 0.055, 0.023, 0.030, 0.07, 0.13, 0.083, 0.0018, 0.044, 0.12, 2.1],
                        &[0.0039, 0.0087, 0.042, 0.022, 0.070, 0.035, 0.047, 0.19, 0.35, 0.130, 0.0020, 0.056, 0.19, 2.5],
                    ]),
                ),
                (2, rows(&[&[0.0047, 0.0096, 0.044, 0.034, 0.073, 0.030, 0.040, 0.094, 0.15, 0.11, 0.0024, 0.058, 0.18, 2.7]])),
                (3, rows(&[&[0.0021, 0.0042, 0.017, 0.010, 0.030, 0.0068, 0.013, 0.026, 0.048, 0.044, 0.0010, 0.023, 0.063, 1.1]])),
                (4, rows(&[&[0.0029, 0.0058, 0.023, 0.014, 0.041, 0.012, 0.018, 0.037, 0.066, 0.060, 0.0014, 0.032, 0.088, 1.5]])),
                (5, rows(&[&[0.0041, 0.0083, 0.042, 0.021, 0.067, 0.026, 0.048, 0.086, 0.14, 0.10, 0.0020, 0.054, 0.15, 2.5]])),
                (6, rows(&[&[0.0023, 0.0092, 0.019, 0.012, 0.033, 0.0096, 0.014, 0.034, 0.053, 0.048, 0.0011, 0.026, 0.07, 1.2]])),
                (7, rows(&[&[0.0005, 0.0015, 0.0091, 0.0044, 0.014, 0.0068, 0.0095, 0.054, 0.069, 0.031, 0.00025, 0.012, 0.046, 0.45]])),
                (8, rows(&[&[0.018, 0.037, 0.19, 0.094, 0.31, 0.10, 0.14, 0.47, 0.60, 0.48, 0.0091, 0.25, 0.68, 11.0]])),
                (9, rows(&[&[0.00032, 0.00096, 0.0059, 0.0029, 0.0094, 0.0044, 0.0062, 0.035, 0.045, 0.020, 0.00016, 0.0076, 0.030, 0.29]])),
                (10, rows(&[&[0.0036, 0.0074, 0.034, 0.019, 0.056, 0.015, 0.015, 0.032, 0.048, 0.077, 0.0014, 0.049, 0.13, 2.3]])),
                (11, rows(&[&[0.00078, 0.0022, 0.013, 0.0056, 0.023, 0.0077, 0.015, 0.053, 0.12, 0.048, 0.00039, 0.017, 0.065, 0.68]])),
                (12, rows(&[&[0.0018, 0.0039, 0.016, 0.0097, 0.028, 0.0091, 0.011, 0.034, 0.057, 0.055, 0.00072, 0.022, 0.066, 1.0]])),
                (13, rows(&[&[0.0061, 0.013, 0.069, 0.039, 0.11, 0.031, 0.061, 0.13, 0.29, 0.18, 0.0030, 0.069, 0.26, 4.0]])),
                (14, rows(&[&[0.024, 0.061, 0.42, 0.18, 0.59, 0.46, 0.55, 2.1, 2.6, 1.2, 0.012, 0.49, 1.7, 21.0]])),
                (15, rows(&[&[0.029, 0.081, 0.58, 0.24, 0.83, 0.73, 0.88, 4.3, 5.4, 2.0, 0.015, 0.68, 2.8, 28.0]])),
                (16, rows(&[&[0.08, 0.27, 1.2, 0.71, 2.3, 0.69, 1.1, 6.2, 12.0, 4.1, 0.032, 1.9, 5.9, 85.0]])),
                (17, rows(&[&[0.033, 0.13, 0.62, 0.31, 0.93, 0.21, 0.28, 2.2, 3.3, 2.2, 0.16, 0.93, 3.2, 37.0]])),
                (18, rows(&[&[0.80, 0.33, 1.6, 0.87, 3.0, 1.0, 1.7, 9.9, 19.0, 8.1, 0.032, 2.5, 8.9, 100.0]])),
                (19, rows(&[&[0.4, 1.3, 6.8, 3.6, 13.0, 5.7, 10.0, 58.0, 90.0, 23.0, 20.0, 0.0, 0.0, 0.0]])),
            ]),
            part_count_pi_q: vec![0.030, 0.10, 0.30, 1.0, 3.0, 3.0, 10.0],
            part_stress_pi_q: keyed(&[
                (1, vec![3.0, 7.0]),
                (2, vec![1.0, 3.0, 10.0]),
                (3, vec![0.03, 0.1, 0.3, 1.0, 3.0, 10.0, 30.0]),
                (4, vec![0.03, 0.1, 0.3, 1.0, 3.0, 7.0, 20.0]),
                (5, vec![0.03, 0.1, 0.3, 1.0, 10.0]),
                (6, vec![0.02, 0.1, 0.3, 1.0, 10.0]),
                (7, vec![0.01, 0.03, 0.1, 0.3, 1.0, 1.5, 3.0, 6.0, 15.0]),
                (8, vec![5.0, 15.0]),
                (9, vec![0.03, 0.1, 0.3, 1.0, 3.0, 3.0, 10.0]),
                (10, vec![0.03, 0.1, 0.3, 1.0, 3.0, 3.0, 10.0]),
                (11, vec![0.03, 0.1, 0.3, 1.0, 3.0, 10.0]),
                (12, vec![0.001, 0.01, 0.03, 0.03, 0.1, 0.3, 1.0, 1.5, 10.0]),
                (13, vec![0.03, 0.1, 0.3, 1.0, 1.5, 3.0, 10.0]),
                (14, vec![0.03, 0.1, 0.3, 1.0, 3.0, 10.0]),
                (15, vec![3.0, 10.0]),
                (16, vec![4.0, 20.0]),
                (17, vec![3.0, 10.0]),
                (18, vec![5.0, 20.0]),
                (19, vec![3.0, 20.0]),
            ]),
            pi_e: vec![1.0, 6.0, 9.0, 9.0, 19.0, 13.0, 29.0, 20.0, 43.0, 24.0, 0.5, 14.0, 32.0, 320.0],
            pi_c: keyed(&[(1, 0.3), (2, 1.0), (3, 2.0), (4, 2.5), (5, 3.0)]),
            pi_cf: keyed(&[(1, 0.1), (2, 1.0)]),
            reference_temperatures: keyed(&[
                (65, 338.0),
                (70, 343.0),
                (85, 358.0),
                (105, 378.0),
                (125, 398.0),
                (150, 423.0),
                (170, 443.0),
                (175, 448.0),
                (200, 473.0),
            ]),
            capacitance_factors: keyed(&[
                (1, [1.2, 0.095]),
                (2, [1.4, 0.12]),
                (3, [1.6, 0.13]),
                (4, [1.2, 0.092]),
                (5, [1.1, 0.085]),
                (6, [1.2, 0.092]),
                (7, [0.45, 0.14]),
                (8, [0.31, 0.23]),
                (9, [0.62, 0.14]),
                (10, [0.41, 0.11]),
                (11, [0.59, 0.12]),
                (12, [1.0, 0.12]),
                (13, [0.82, 0.066]),
                (14, [0.34, 0.18]),
                (15, [0.321, 0.19]),
                (16, [1.0, 0.0]),
                (17, [1.0, 0.0]),
                (18, [1.0, 0.0]),
                (19, [1.0, 0.0]),
            ]),
            lambda_b_factors: keyed(&[
                (1, [0.00086, 0.4, 5.0, 2.5, 1.8]),
                (2, [0.00115, 0.4, 5.0, 2.5, 1.8]),
                (3, [0.0005, 0.4, 5.0, 2.5, 1.8]),
                (4, [0.00069, 0.4, 5.0, 2.5, 1.8]),
                (5, [0.00099, 0.4, 5.0, 2.5, 1.8]),
                (6, [0.00055, 0.4, 5.0, 2.5, 1.8]),
                (7, [8.6e-10, 0.4, 3.0, 16.0, 1.0]),
                (8, [0.0053, 0.4, 3.0, 1.2, 6.3]),
                (9, [8.25e-10, 0.5, 4.0, 16.0, 1.0]),
                (10, [0.0003, 0.3, 3.0, 1.0, 1.0]),
                (11, [2.6e-9, 0.3, 3.0, 14.3, 1.0]),
                (12, [0.00375, 0.4, 3.0, 2.6, 9.0]),
                (13, [0.00165, 0.4, 3.0, 2.6, 9.0]),
                (14, [0.00254, 0.5, 3.0, 5.09, 5.0]),
                (15, [0.0028, 0.55, 3.0, 4.09, 5.9]),
                (16, [0.00224, 0.17, 3.0, 1.59, 10.1]),
                (17, [7.3e-7, 0.33, 3.0, 12.1, 1.0]),
                (18, [1.92e-6, 0.33, 3.0, 10.8, 1.0]),
                (19, [0.0112, 0.17, 3.0, 1.59, 10.1]),
            ]),
        }
    }
}

// ============================================================================
// Connections (MIL-HDBK-217F section 15-17)
// ============================================================================

/// Connection tables, keyed by subcategory:
/// 1 circular/rack/panel connector, 2 PCB edge connector, 3 IC socket,
/// 4 plated-through-hole interconnect, 5 non-PTH connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionTables {
    /// Parts-count base rates; one row per type where the subcategory
    /// distinguishes them (1 and 5).
    pub part_count_lambda_b: BTreeMap<u32, Vec<Vec<f64>>>,
    /// Constant part-stress base rates by subcategory, indexed by type
    /// where there is more than one.
    pub part_stress_lambda_b: BTreeMap<u32, Vec<f64>>,
    /// Environment factors; one row per quality level for subcategories
    /// 1 and 2.
    pub pi_e: BTreeMap<u32, Vec<Vec<f64>>>,
    /// Quality factors: MIL-SPEC, lower.
    pub pi_q: Vec<f64>,
    /// Mate/unmate factors for ≤0.05, ≤0.5, ≤5, ≤50 and more cycles per
    /// 1000 hours.
    pub pi_k: Vec<f64>,
    /// Reference temperature (K) by reference key.
    pub reference_temperatures: BTreeMap<u32, f64>,
    /// Reference key by connector type, specification and insert material
    /// (`keys[type][spec][insert - 1]`).
    pub reference_keys: BTreeMap<u32, BTreeMap<u32, Vec<u32>>>,
    /// `lambda_b = f0 * exp(f1/T + (T/Tref)^f2)` coefficients by reference key.
    pub lambda_b_factors: BTreeMap<u32, [f64; 3]>,
    /// Coefficients and reference temperature for PCB edge connectors.
    pub edge_lambda_b_factors: [f64; 3],
    pub edge_reference_temperature: f64,
    /// Insert temperature rise coefficient by subcategory and contact gauge.
    pub contact_gauge_factors: BTreeMap<u32, BTreeMap<u32, f64>>,
}

impl Default for ConnectionTables {
    fn default() -> Self {
        let sub5_types: &[&[f64]] = &[
            &[0.0026, 0.0052, 0.018, 0.010, 0.029, 0.010, 0.016, 0.016, 0.021, 0.042, 0.0013, 0.023, 0.062, 1.1],
            &[0.00014, 0.00028, 0.00096, 0.00056, 0.0015, 0.00056, 0.00084, 0.00084, 0.0011, 0.0022, 0.00007, 0.0013, 0.0034, 0.059],
            &[0.00026, 0.00052, 0.0018, 0.0010, 0.0029, 0.0010, 0.0016, 0.0016, 0.0021, 0.0042, 0.00013, 0.0023, 0.0062, 0.11],
            &[0.00005, 0.0001, 0.00035, 0.0002, 0.00055, 0.0002, 0.0003, 0.0003, 0.0004, 0.0008, 0.000025, 0.00045, 0.0012, 0.021],
            &[0.0000035, 0.000007, 0.000025, 0.000014, 0.000039, 0.000014, 0.000021, 0.000021, 0.000028, 0.000056, 0.0000018, 0.000031, 0.000084, 0.0015],
            &[0.00012, 0.00024, 0.00084, 0.00048, 0.0013, 0.00048, 0.00072, 0.00072, 0.00096, 0.0019, 0.00005, 0.0011, 0.0029, 0.050],
            &[0.000069, 0.000138, 0.000483, 0.000276, 0.000759, 0.000276, 0.000414, 0.000414, 0.000552, 0.001104, 0.000035, 0.000621, 0.001656, 0.02898],
        ];
        let low_mixed = vec![1, 1, 1, 2, 2, 2, 2, 2, 2];
        let plain = vec![2; 6];
        let with_high = vec![2, 2, 2, 2, 2, 2, 4, 4, 4];
        let pth = vec![3, 3];
        let pth_mixed = vec![3, 3, 2, 2, 2, 2, 2, 2];

        Self {
            part_count_lambda_b: keyed(&[
                (
                    1,
                    rows(&[
                        &[0.011, 0.14, 0.11, 0.069, 0.20, 0.058, 0.098, 0.23, 0.34, 0.37, 0.0054, 0.16, 0.42, 6.8],
                        &[0.012, 0.015, 0.13, 0.075, 0.21, 0.06, 0.1, 0.22, 0.32, 0.38, 0.0061, 0.18, 0.54, 7.3],
                    ]),
                ),
                (2, rows(&[&[0.0054, 0.021, 0.055, 0.035, 0.10, 0.059, 0.11, 0.085, 0.16, 0.19, 0.0027, 0.078, 0.21, 3.4]])),
                (3, rows(&[&[0.0019, 0.0058, 0.027, 0.012, 0.035, 0.015, 0.023, 0.021, 0.025, 0.048, 0.00097, 0.027, 0.070, 1.3]])),
                (4, rows(&[&[0.053, 0.11, 0.37, 0.69, 0.27, 0.27, 0.43, 0.85, 1.5, 1.0, 0.027, 0.53, 1.4, 27.0]])),
                (5, rows(sub5_types)),
            ]),
            part_stress_lambda_b: keyed(&[
                (3, vec![0.00042]),
                (4, vec![0.000041, 0.00026]),
                (5, vec![0.0026, 0.00014, 0.00026, 0.00005, 0.0000035, 0.00012, 0.000069]),
            ]),
            pi_e: keyed(&[
                (
                    1,
                    rows(&[
                        &[1.0, 1.0, 8.0, 5.0, 13.0, 3.0, 5.0, 8.0, 12.0, 19.0, 0.5, 10.0, 27.0, 490.0],
                        &[2.0, 5.0, 21.0, 10.0, 27.0, 12.0, 18.0, 17.0, 25.0, 37.0, 0.8, 20.0, 54.0, 970.0],
                    ]),
                ),
                (
                    2,
                    rows(&[
                        &[1.0, 3.0, 8.0, 5.0, 13.0, 6.0, 11.0, 6.0, 11.0, 19.0, 0.5, 10.0, 27.0, 490.0],
                        &[2.0, 7.0, 17.0, 10.0, 26.0, 14.0, 22.0, 14.0, 22.0, 37.0, 0.8, 20.0, 54.0, 970.0],
                    ]),
                ),
                (3, rows(&[&[1.0, 3.0, 14.0, 6.0, 18.0, 8.0, 12.0, 11.0, 13.0, 25.0, 0.5, 14.0, 36.0, 650.0]])),
                (4, rows(&[&[1.0, 2.0, 7.0, 5.0, 13.0, 5.0, 8.0, 16.0, 28.0, 19.0, 0.5, 10.0, 27.0, 500.0]])),
                (5, rows(&[&[1.0, 2.0, 7.0, 4.0, 11.0, 4.0, 6.0, 6.0, 8.0, 16.0, 0.5, 9.0, 24.0, 420.0]])),
            ]),
            pi_q: vec![1.0, 2.0],
            pi_k: vec![1.0, 1.5, 2.0, 3.0, 4.0],
            reference_temperatures: keyed(&[(1, 473.0), (2, 423.0), (3, 373.0), (4, 358.0)]),
            reference_keys: keyed(&[
                (
                    1,
                    keyed(&[
                        (1, plain.clone()),
                        (2, plain.clone()),
                        (3, low_mixed.clone()),
                        (4, low_mixed.clone()),
                        (5, low_mixed.clone()),
                    ]),
                ),
                (
                    2,
                    keyed(&[
                        (1, with_high.clone()),
                        (2, vec![1, 1, 1, 2, 2, 2, 2, 2, 2, 4, 4, 4]),
                        (3, low_mixed.clone()),
                        (4, low_mixed),
                        (5, plain.clone()),
                        (6, plain),
                    ]),
                ),
                (3, keyed(&[(1, with_high.clone()), (2, with_high)])),
                (
                    4,
                    keyed(&[
                        (1, pth.clone()),
                        (2, pth.clone()),
                        (3, pth.clone()),
                        (4, pth.clone()),
                        (5, pth.clone()),
                        (6, pth.clone()),
                        (7, pth),
                        (8, pth_mixed.clone()),
                    ]),
                ),
                (5, keyed(&[(1, pth_mixed)])),
            ]),
            lambda_b_factors: keyed(&[
                (1, [0.2, -1592.0, 5.36]),
                (2, [0.431, -2073.6, 4.66]),
                (3, [0.19, -1298.0, 4.25]),
                (4, [0.77, -1528.8, 4.72]),
            ]),
            edge_lambda_b_factors: [0.216, -2073.6, 4.66],
            edge_reference_temperature: 423.0,
            contact_gauge_factors: keyed(&[
                (1, keyed(&[(12, 0.1), (16, 0.274), (20, 0.64), (22, 0.989)])),
                (2, keyed(&[(20, 0.64), (22, 0.989), (26, 2.1)])),
            ]),
        }
    }
}

// ============================================================================
// Solid-state relays (MIL-HDBK-217F section 13.2)
// ============================================================================

/// Solid-state and time-delay relay tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayTables {
    /// Parts-count base rates by construction.
    pub part_count_lambda_b: Vec<Vec<f64>>,
    /// Part-stress base rates by construction.
    pub part_stress_lambda_b: Vec<f64>,
    /// Quality factors by quality id.
    pub pi_q: Vec<f64>,
    /// Environment factors.
    pub pi_e: Vec<f64>,
}

impl Default for RelayTables {
    fn default() -> Self {
        Self {
            part_count_lambda_b: rows(&[
                &[0.40, 1.2, 4.8, 2.4, 6.8, 4.8, 7.6, 8.4, 13.0, 9.2, 0.16, 4.8, 13.0, 240.0],
                &[0.50, 1.5, 6.0, 3.0, 8.5, 5.0, 9.5, 11.0, 16.0, 12.0, 0.20, 5.0, 17.0, 300.0],
            ]),
            part_stress_lambda_b: vec![0.4, 0.5],
            pi_q: vec![1.0, 4.0],
            pi_e: vec![1.0, 3.0, 12.0, 6.0, 17.0, 12.0, 19.0, 21.0, 32.0, 23.0, 0.4, 12.0, 33.0, 590.0],
        }
    }
}

// ============================================================================
// Meters (MIL-HDBK-217F section 18)
// ============================================================================

/// Elapsed-time (subcategory 1) and panel (subcategory 2) meter tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterTables {
    /// Elapsed-time parts-count base rates by application.
    pub elapsed_part_count_lambda_b: Vec<Vec<f64>>,
    /// Elapsed-time part-stress base rates by application.
    pub elapsed_lambda_b: Vec<f64>,
    pub elapsed_pi_e: Vec<f64>,
    /// Panel-meter parts-count base rates by application.
    pub panel_part_count_lambda_b: Vec<Vec<f64>>,
    pub panel_lambda_b: f64,
    pub panel_pi_q: Vec<f64>,
    pub panel_pi_e: Vec<f64>,
}

impl Default for MeterTables {
    fn default() -> Self {
        Self {
            elapsed_part_count_lambda_b: rows(&[
                &[10.0, 20.0, 120.0, 70.0, 180.0, 50.0, 80.0, 160.0, 250.0, 260.0, 5.0, 140.0, 380.0, 0.0],
                &[15.0, 30.0, 180.0, 105.0, 270.0, 75.0, 120.0, 240.0, 375.0, 390.0, 7.5, 210.0, 570.0, 0.0],
                &[40.0, 80.0, 480.0, 280.0, 720.0, 200.0, 320.0, 640.0, 1000.0, 1040.0, 20.0, 560.0, 1520.0, 0.0],
            ]),
            elapsed_lambda_b: vec![20.0, 30.0, 80.0],
            elapsed_pi_e: vec![1.0, 2.0, 12.0, 7.0, 18.0, 5.0, 8.0, 16.0, 25.0, 26.0, 0.5, 14.0, 38.0, 0.0],
            panel_part_count_lambda_b: rows(&[
                &[0.09, 0.36, 2.3, 1.1, 3.2, 2.5, 3.8, 5.2, 6.6, 5.4, 0.099, 5.4, 0.0, 0.0],
                &[0.15, 0.81, 2.8, 1.8, 5.4, 4.3, 6.4, 8.9, 11.0, 9.2, 0.17, 9.2, 0.0, 0.0],
            ]),
            panel_lambda_b: 0.09,
            panel_pi_q: vec![1.0, 3.4],
            panel_pi_e: vec![1.0, 4.0, 25.0, 12.0, 35.0, 28.0, 42.0, 58.0, 73.0, 60.0, 1.1, 60.0, 0.0, 0.0],
        }
    }
}

// ============================================================================
// Optoelectronic detectors (MIL-HDBK-217F section 6.11)
// ============================================================================

/// Optoelectronic detector, isolator and emitter tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptoelectronicTables {
    /// Part-stress base rates by device type (1-12).
    pub lambda_b: Vec<f64>,
    /// Parts-count base rates: types 1-2, types 3-10, all others.
    pub part_count_lambda_b: Vec<Vec<f64>>,
    pub pi_q: Vec<f64>,
    pub pi_e: Vec<f64>,
    /// Activation term `Ea/k` (K) for the junction temperature factor.
    pub activation_temperature: f64,
}

impl Default for OptoelectronicTables {
    fn default() -> Self {
        Self {
            lambda_b: vec![
                0.0055, 0.0040, 0.0025, 0.013, 0.013, 0.0064, 0.0033, 0.017, 0.017, 0.0086, 0.0013,
                0.00023,
            ],
            part_count_lambda_b: rows(&[
                &[0.011, 0.029, 0.083, 0.059, 0.18, 0.084, 0.11, 0.21, 0.35, 0.34, 0.0057, 0.15, 0.51, 3.7],
                &[0.027, 0.07, 0.2, 0.14, 0.43, 0.2, 0.25, 0.49, 0.83, 0.8, 0.013, 0.35, 1.2, 8.7],
                &[0.00047, 0.0012, 0.0035, 0.0025, 0.0077, 0.0035, 0.0044, 0.0086, 0.015, 0.014, 0.00024, 0.0053, 0.021, 0.15],
            ]),
            pi_q: vec![0.7, 1.0, 2.4, 5.5, 8.0],
            pi_e: vec![1.0, 2.0, 8.0, 5.0, 12.0, 4.0, 6.0, 6.0, 8.0, 17.0, 0.5, 9.0, 24.0, 450.0],
            activation_temperature: 2790.0,
        }
    }
}

impl HandbookTables {
    /// Every environment-indexed row, labelled for validation messages.
    pub fn environment_rows(&self) -> Vec<(String, &[f64])> {
        let mut out: Vec<(String, &[f64])> = Vec::new();
        for (sub, rs) in &self.capacitor.part_count_lambda_b {
            for (i, r) in rs.iter().enumerate() {
                out.push((format!("capacitor.part_count_lambda_b.{}[{}]", sub, i), r.as_slice()));
            }
        }
        out.push(("capacitor.pi_e".to_string(), self.capacitor.pi_e.as_slice()));
        for (sub, rs) in &self.connection.part_count_lambda_b {
            for (i, r) in rs.iter().enumerate() {
                out.push((format!("connection.part_count_lambda_b.{}[{}]", sub, i), r.as_slice()));
            }
        }
        for (sub, rs) in &self.connection.pi_e {
            for (i, r) in rs.iter().enumerate() {
                out.push((format!("connection.pi_e.{}[{}]", sub, i), r.as_slice()));
            }
        }
        for (i, r) in self.relay.part_count_lambda_b.iter().enumerate() {
            out.push((format!("relay.part_count_lambda_b[{}]", i), r.as_slice()));
        }
        out.push(("relay.pi_e".to_string(), self.relay.pi_e.as_slice()));
        for (i, r) in self.meter.elapsed_part_count_lambda_b.iter().enumerate() {
            out.push((format!("meter.elapsed_part_count_lambda_b[{}]", i), r.as_slice()));
        }
        out.push(("meter.elapsed_pi_e".to_string(), self.meter.elapsed_pi_e.as_slice()));
        for (i, r) in self.meter.panel_part_count_lambda_b.iter().enumerate() {
            out.push((format!("meter.panel_part_count_lambda_b[{}]", i), r.as_slice()));
        }
        out.push(("meter.panel_pi_e".to_string(), self.meter.panel_pi_e.as_slice()));
        for (i, r) in self.optoelectronic.part_count_lambda_b.iter().enumerate() {
            out.push((format!("optoelectronic.part_count_lambda_b[{}]", i), r.as_slice()));
        }
        out.push(("optoelectronic.pi_e".to_string(), self.optoelectronic.pi_e.as_slice()));
        out
    }
}
