//! Printer list filtering

use powermis_core::PrinterInfo;

/// Name fragments of software printers that never produce paper
const VIRTUAL_MARKERS: [&str; 6] = [
    "microsoft print to pdf",
    "microsoft xps document writer",
    "onenote",
    "fax",
    "pdf",
    "xps",
];

/// Whether `name` looks like a software printer. Case-insensitive substring
/// match, so "PDFCreator" and "Fax Room 2" count as virtual too.
pub fn is_virtual_printer(name: &str) -> bool {
    let name = name.to_lowercase();
    if VIRTUAL_MARKERS.iter().any(|marker| name.contains(marker)) {
        return true;
    }
    name.contains("microsoft")
        && ["pdf", "xps", "onenote"]
            .iter()
            .any(|marker| name.contains(marker))
}

/// Drop software printers, keeping the platform order
pub fn physical_printers(printers: Vec<PrinterInfo>) -> Vec<PrinterInfo> {
    printers
        .into_iter()
        .filter(|p| {
            let name = if p.name.is_empty() { &p.display_name } else { &p.name };
            !is_virtual_printer(name)
        })
        .collect()
}
