// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::augment::AugmentationParams;
use crate::error::Result;
use crate::frame::load_frame;
use crate::labels::err2gt;
use crate::metadata::SessionMeta;
use crate::{info, success};

use super::args::ShowArgs;

/// Load one frame and print its derived region labels.
pub fn run(args: &ShowArgs) -> Result<()> {
    let session = SessionMeta::from_file(&args.recordings.join(&args.session))?;
    let params = AugmentationParams::default();
    let frame = load_frame(
        &args.recordings,
        &session,
        args.frame,
        &params,
        args.mode,
        args.encoding,
    )?;

    info!(
        "Session '{}', frame {} ({} mode)",
        session.name, args.frame, args.mode
    );
    for (r, &label) in frame.labels.iter().enumerate() {
        let region = args.mode.region_name(r).unwrap_or_default();
        info!("  {region}: class {label}");
    }

    let gt = err2gt(&frame.labels, args.mode)?;
    let bits: String = gt
        .iter()
        .map(|&v| if v > 0.5 { '1' } else { '0' })
        .collect();
    info!("gt vector: {bits}");

    if let Some(path) = &args.save {
        frame.save_preview(path)?;
        success!("Preview saved to {}", path.display());
    }
    Ok(())
}
