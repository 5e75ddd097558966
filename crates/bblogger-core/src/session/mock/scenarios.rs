//! Pre-built mock modem scripts.

use super::MockModem;
use crate::driver::Vigor130;

/// `show status` body as printed by a Vigor130 in SHOWTIME.
pub const VIGOR130_STATUS: &str = "\
System Status\r
Model Name     : Vigor130\r
Firmware Version : 3.8.4.1_BT\r
Build Date/Time  : Mar 12 2020 10:22:21\r
System Date:2026-10-18 System Time:09:12:44\r
System Uptime:26:43\r
LAN   Status\r
IP Address:192.168.2.1 Tx Packets:184003 Rx Packets:167231\r
WAN 1 Status: Bridge\r
Mode: VDSL2 Line Status: SHOWTIME\r
";

/// `show adsl` body as printed by a Vigor130 in SHOWTIME.
pub const VIGOR130_ADSL: &str = "\
  ---------------------- ATU-R Info (hw: annex A, f/w: annex A/B/C) -----------\r
   Running Mode            :      17A       State                : SHOWTIME\r
   DS Actual Rate          : 41233000 bps   US Actual Rate       :  9994000 bps\r
   DS Attainable Rate      : 42592000 bps   US Attainable Rate   :  9999000 bps\r
   DS Path Mode            :        Fast    US Path Mode         :        Fast\r
   DS Interleave Depth     :        1       US Interleave Depth  :        1\r
   NE Current Attenuation  :       15 dB    Cur SNR Margin       :        6.3 dB\r
   DS actual PSD           :     8. 8 dB    US actual PSD        :    -4. 2 dB\r
   NE Rcvd Cells           :              0\r
   NE Xmitted Cells        :              0\r
   NE CRC Count            :            148   FE CRC Count         :           10\r
   NE ES Count             :             32   FE  ES Count         :            0\r
   Xdsl Reset Times        :              0   Xdsl Link  Times     :            1\r
   ITU Version[0]          :    00000000        ITU Version[1]       :   00000000\r
   VDSL Firmware Version   :    05-07-06-0D-01-07   [with Vectoring support]\r
   Power Management Mode   :  DSL_G997_PMS_L0\r
   Test Mode               :  DISABLE\r
  -------------------------- ATU-C Info ---------------------------------------\r
   Far Current Attenuation :            0 dB   Far SNR Margin       :        5.8 dB\r
   CO ITU Version[0]       :    b5004244        CO ITU Version[1]     :   434d0000\r
   DSLAM CHIPSET VENDOR    :  < BDCM >\r
";

impl MockModem {
    /// A healthy Vigor130 answering `show status` and `show adsl`.
    pub fn vigor130() -> Self {
        Self::new(Vigor130::PROMPTS)
            .banner("\r\nDraytek Vigor130 Telnet\r\n\r\n")
            .respond("show status", VIGOR130_STATUS)
            .respond("show adsl", VIGOR130_ADSL)
    }
}
