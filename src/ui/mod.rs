pub mod progress;

use crate::catalog::{DatasetGroup, hierarchy};
use crate::constellation::{ConstellationSpec, DecisionRegions, Scheme};
use crate::sweep::SweepReport;

pub fn print_banner() {
    eprintln!("waveset-rs {}", env!("CARGO_PKG_VERSION"));
}

pub fn print_datasets() {
    for group in DatasetGroup::ALL {
        let labels: Vec<&str> = group
            .modulations()
            .iter()
            .map(|m| m.label())
            .collect();
        println!("{:<14} {}", group.name(), labels.join(" "));
    }
}

pub fn print_hierarchy() {
    for (domain, families) in hierarchy() {
        println!("{}", domain);
        for (family, members) in families {
            let labels: Vec<&str> = members
                .iter()
                .map(|m| m.label())
                .collect();
            println!("  {:<14} {}", family.name(), labels.join(" "));
        }
    }
}

/// Point table of one constellation: symbol, Gray bits, coordinates.
pub fn print_constellation(scheme: Scheme, spec: &ConstellationSpec) {
    let bits = spec.bits_per_symbol();
    println!(
        "{}: {} points, {} bits/symbol, rotational symmetry {}, dimensionality {}",
        scheme,
        spec.len(),
        bits,
        spec.rotational_symmetry(),
        spec.dimensionality()
    );
    if let DecisionRegions::Sectors(map) = spec.regions() {
        let layout = map.layout();
        println!(
            "sectors: {} x {} (widths {} x {}), {} point(s) per sector",
            layout.real_sectors,
            layout.imag_sectors,
            layout.real_width,
            layout.imag_width,
            map.multiplicity()
        );
    }
    for (symbol, point) in spec.points().iter().enumerate() {
        println!(
            "{:>3}  {:0width$b}  {:>8.4} {:>+8.4}j",
            symbol,
            spec.bits_for_symbol(symbol),
            point.coord.re,
            point.coord.im,
            width = bits.max(1)
        );
    }
}

pub fn print_report(report: &SweepReport) {
    println!(
        "{} rows from {}/{} jobs",
        report.dataset.len(),
        report.completed,
        report.total_jobs()
    );
    for failure in &report.failures {
        println!(
            "  job {:>4} {:<14} {:>6.1} dB: {}",
            failure.index, failure.modulation.label(), failure.snr_db, failure.error
        );
    }
}
