use crate::catalog::{CatalogError, StatCatalog, ValueKind};
use crate::session::Prompts;

use super::ModemDriver;

const COUNTER: ValueKind = ValueKind::Counter {
    sign_corrected: false,
};
const SIGNED_COUNTER: ValueKind = ValueKind::Counter {
    sign_corrected: true,
};

/// Report order of the Vigor130 statistics.
const REPORT_ORDER: &[&str] = &[
    "Uptime",
    "Reset Times",
    "Link Times",
    "DS Actual",
    "DS Attainable",
    "US Actual",
    "US Attainable",
    "NE SNR Margin",
    "NE CRC Count",
    "NE ES Count",
    "FE SNR Margin",
    "FE CRC Count",
    "FE ES Count",
];

/// DrayTek Vigor130 VDSL2/ADSL2+ modem.
#[derive(Debug, Clone)]
pub struct Vigor130 {
    catalog: StatCatalog,
}

impl Vigor130 {
    pub const PROMPTS: Prompts = Prompts::new("Account:", "Password: ", "> ");

    pub fn new() -> Result<Self, CatalogError> {
        // Field labels are matched as printed, double spaces included.
        let catalog = StatCatalog::builder()
            .group("show status")
            .stat("Uptime", r"System Uptime:(\d+):(\d+)", ValueKind::Duration)
            .group("show adsl")
            .stat("DS Actual", r"DS Actual Rate +: +(\d+)", COUNTER)
            .stat("DS Attainable", r"DS Attainable Rate +: +(\d+)", COUNTER)
            .stat("US Actual", r"US Actual Rate +: +(\d+)", COUNTER)
            .stat("US Attainable", r"US Attainable Rate +: +(\d+)", COUNTER)
            .stat(
                "NE SNR Margin",
                r"Cur SNR Margin +: +(\d+)(?:\.(\d+))?",
                ValueKind::FixedPoint,
            )
            .stat("NE CRC Count", r"NE CRC Count +: +(-?\d+)", SIGNED_COUNTER)
            .stat("NE ES Count", r"NE ES Count +: +(-?\d+)", SIGNED_COUNTER)
            .stat(
                "FE SNR Margin",
                r"Far SNR Margin +: +(\d+)(?:\.(\d+))?",
                ValueKind::FixedPoint,
            )
            .stat("FE CRC Count", r"FE CRC Count +: +(-?\d+)", SIGNED_COUNTER)
            .stat("FE ES Count", r"FE  ES Count +: +(-?\d+)", SIGNED_COUNTER)
            .stat("Reset Times", r"Xdsl Reset Times +: +(\d+)", COUNTER)
            .stat("Link Times", r"Xdsl Link  Times +: +(\d+)", COUNTER)
            .report_order(REPORT_ORDER)
            .build()?;
        Ok(Self { catalog })
    }
}

impl ModemDriver for Vigor130 {
    fn model(&self) -> &'static str {
        "Vigor130"
    }

    fn prompts(&self) -> Prompts {
        Self::PROMPTS
    }

    fn catalog(&self) -> &StatCatalog {
        &self.catalog
    }
}
