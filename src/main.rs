use std::path::PathBuf;
use std::process::ExitCode;

use street_heading::{
    config, maps_url, save_image, ImageSize, LatLng, ParameterOverrides, Result, SaveOptions,
    Source, StreetView, StreetViewError, Target, ViewSaveExt,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Fetch the Street View image nearest a point, looking at the point.

USAGE:
    street-heading [OPTIONS]

TARGET (default: --lat 42.43849650076074 --lng -76.50318614115257):
    --lat <DEG> --lng <DEG>    Target coordinates; the camera faces them
    --address <TEXT>           Free-form address, passed to Google as is
    --url <MAPS_URL>           Google Maps URL to take coordinates from

OPTIONS:
    --key <KEY>                API key (else GOOGLE_MAPS_API_KEY or settings file)
    --config <PATH>            Settings file (default: <config dir>/street-heading/settings.toml)
    --heading <DEG>            Camera heading; disables aiming at the target
    --fov <DEG>                Field of view, (0, 120]
    --pitch <DEG>              Camera pitch
    --radius <METERS>          Panorama search radius
    --size <WxH>               Image size, e.g. 640x640
    --source <default|outdoor> Imagery source
    --output <PATH>            Where to write the image [default: streetview.jpg]
    --quality <1-100>          JPEG quality [default: 90]
    --print-urls               Print the metadata URL and an image URL placed at
                               the target, then exit without fetching
    -h, --help                 Print this help
";

const DEFAULT_TARGET: LatLng = LatLng {
    lat: 42.43849650076074,
    lng: -76.50318614115257,
};

#[derive(Debug)]
struct Cli {
    key: Option<String>,
    config: Option<PathBuf>,
    target: Target,
    overrides: ParameterOverrides,
    output: PathBuf,
    quality: Option<u8>,
    print_urls: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let cli = match parse_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };
    if let Some(key) = cli.key {
        settings.api_key = Some(key);
    }
    if settings.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        warn!("no API key configured; Google will reject the request");
    }

    let client = StreetView::from_settings(&settings)?;

    if cli.print_urls {
        print!("{}", url_report(&client, &cli.target, &cli.overrides)?);
        return Ok(());
    }

    let view = client.resolve(&cli.target, &cli.overrides).await?;
    let meta = &view.metadata;
    info!(
        pano_id = meta.pano_id.as_deref().unwrap_or("?"),
        location = %view.parameters.location,
        heading = view.parameters.heading,
        "resolved panorama"
    );

    match cli.quality {
        Some(quality) => {
            let options = SaveOptions::for_path(&cli.output).jpeg_quality(quality);
            save_image(&view.image, &cli.output, &options)?;
        }
        None => view.image.save_view(&cli.output)?,
    }
    println!("panorama:  {}", meta.pano_id.as_deref().unwrap_or("unknown"));
    if let Some(date) = &meta.date {
        println!("captured:  {date}");
    }
    println!("location:  {}", view.parameters.location);
    println!("heading:   {:.1}", view.parameters.heading);
    println!("fov:       {}", view.parameters.fov);
    if let Some(copyright) = &meta.copyright {
        println!("copyright: {copyright}");
    }
    println!("saved to:  {}", cli.output.display());
    Ok(())
}

/// URLs for `--print-urls`. Nothing is sent, so the panorama position is
/// unknown and the image URL is placed at the target itself.
fn url_report(client: &StreetView, target: &Target, overrides: &ParameterOverrides) -> Result<String> {
    let lookup = overrides.clone().location(target.location());
    let mut report = format!(
        "metadata:        {}\nimage at target: {}\n",
        client.metadata_url(&lookup)?,
        client.panorama_url(&lookup)?
    );
    if matches!(target, Target::Coordinates(_)) && overrides.heading.is_none() {
        report.push_str(
            "note: the fetched image is taken from the panorama and aimed at the target; \
             its heading is only known after the metadata lookup\n",
        );
    }
    Ok(report)
}

fn parse_args(mut args: pico_args::Arguments) -> Result<Cli> {
    let key: Option<String> = args.opt_value_from_str("--key").map_err(invalid)?;
    let config: Option<PathBuf> = args.opt_value_from_os_str("--config", |s| {
        Ok::<_, std::convert::Infallible>(PathBuf::from(s))
    })
    .map_err(invalid)?;

    let lat: Option<f64> = args.opt_value_from_str("--lat").map_err(invalid)?;
    let lng: Option<f64> = args.opt_value_from_str("--lng").map_err(invalid)?;
    let address: Option<String> = args.opt_value_from_str("--address").map_err(invalid)?;
    let url: Option<String> = args.opt_value_from_str("--url").map_err(invalid)?;
    let target = select_target(lat, lng, address, url)?;

    let mut overrides = ParameterOverrides::new();
    if let Some(heading) = args.opt_value_from_str::<_, f64>("--heading").map_err(invalid)? {
        overrides.heading = Some(normalize_heading(heading)?);
    }
    if let Some(fov) = args.opt_value_from_str::<_, f64>("--fov").map_err(invalid)? {
        if !(fov > 0.0 && fov <= 120.0) {
            return Err(StreetViewError::InvalidArgument(format!("--fov must be in (0, 120], got {fov}")));
        }
        overrides.fov = Some(fov);
    }
    overrides.pitch = args.opt_value_from_str("--pitch").map_err(invalid)?;
    if let Some(radius) = args.opt_value_from_str::<_, u32>("--radius").map_err(invalid)? {
        if radius == 0 {
            return Err(StreetViewError::InvalidArgument("--radius must be positive".to_string()));
        }
        overrides.radius = Some(radius);
    }
    overrides.size = args.opt_value_from_fn("--size", str::parse::<ImageSize>).map_err(invalid)?;
    overrides.source = args.opt_value_from_fn("--source", str::parse::<Source>).map_err(invalid)?;

    let output = args
        .opt_value_from_os_str("--output", |s| Ok::<_, std::convert::Infallible>(PathBuf::from(s)))
        .map_err(invalid)?
        .unwrap_or_else(|| PathBuf::from("streetview.jpg"));
    let quality = match args.opt_value_from_str::<_, u8>("--quality").map_err(invalid)? {
        Some(q) if !(1..=100).contains(&q) => {
            return Err(StreetViewError::InvalidArgument(format!("--quality must be in 1-100, got {q}")));
        }
        q => q,
    };
    let print_urls = args.contains("--print-urls");

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(StreetViewError::InvalidArgument(format!("unexpected arguments: {rest:?}")));
    }

    Ok(Cli {
        key,
        config,
        target,
        overrides,
        output,
        quality,
        print_urls,
    })
}

fn select_target(
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<String>,
    url: Option<String>,
) -> Result<Target> {
    let coordinates = match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let point = LatLng::new(lat, lng);
            if !point.is_valid() {
                return Err(StreetViewError::InvalidArgument(format!(
                    "coordinates out of range: {point}"
                )));
            }
            Some(Target::Coordinates(point))
        }
        (None, None) => None,
        _ => {
            return Err(StreetViewError::InvalidArgument(
                "--lat and --lng must be given together".to_string(),
            ))
        }
    };
    let from_url = url.as_deref().map(maps_url::target_from_url).transpose()?;
    let from_address = address.map(Target::Address);

    let mut given = [coordinates, from_address, from_url].into_iter().flatten();
    match (given.next(), given.next()) {
        (None, _) => Ok(Target::Coordinates(DEFAULT_TARGET)),
        (Some(target), None) => Ok(target),
        (Some(_), Some(_)) => Err(StreetViewError::InvalidArgument(
            "give only one of --lat/--lng, --address or --url".to_string(),
        )),
    }
}

/// Bring a heading into [0, 360); the 360 end of a slider means north.
fn normalize_heading(heading: f64) -> Result<f64> {
    if !heading.is_finite() {
        return Err(StreetViewError::InvalidArgument(format!("--heading must be finite, got {heading}")));
    }
    let normalized = heading.rem_euclid(360.0);
    Ok(if normalized >= 360.0 { 0.0 } else { normalized })
}

fn invalid(e: pico_args::Error) -> StreetViewError {
    StreetViewError::InvalidArgument(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> Result<Cli> {
        parse_args(pico_args::Arguments::from_vec(
            args.iter().map(OsString::from).collect(),
        ))
    }

    #[test]
    fn test_defaults_to_builtin_target() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.target, Target::Coordinates(DEFAULT_TARGET));
        assert_eq!(cli.overrides, ParameterOverrides::new());
        assert_eq!(cli.output, PathBuf::from("streetview.jpg"));
        assert_eq!(cli.quality, None);
        assert!(!cli.print_urls);
    }

    #[test]
    fn test_full_argument_set() {
        let cli = parse(&[
            "--lat", "42.44", "--lng", "-76.5", "--heading", "360", "--fov", "20",
            "--radius", "100", "--size", "300x200", "--source", "outdoor",
            "--output", "out/view.png", "--quality", "75", "--print-urls",
        ])
        .unwrap();
        assert_eq!(cli.target, Target::coordinates(42.44, -76.5));
        assert_eq!(cli.overrides.heading, Some(0.0));
        assert_eq!(cli.overrides.fov, Some(20.0));
        assert_eq!(cli.overrides.radius, Some(100));
        assert_eq!(cli.overrides.size, Some(ImageSize::new(300, 200)));
        assert_eq!(cli.overrides.source, Some(Source::Outdoor));
        assert_eq!(cli.output, PathBuf::from("out/view.png"));
        assert_eq!(cli.quality, Some(75));
        assert!(cli.print_urls);
    }

    #[test]
    fn test_address_target() {
        let cli = parse(&["--address", "123 Main St, City"]).unwrap();
        assert_eq!(cli.target, Target::address("123 Main St, City"));
    }

    #[test]
    fn test_url_target() {
        let cli = parse(&["--url", "https://www.google.com/maps/@41.8982208,12.4764804,17z"]).unwrap();
        assert_eq!(cli.target, Target::coordinates(41.8982208, 12.4764804));
    }

    #[test]
    fn test_rejects_conflicting_targets() {
        assert!(parse(&["--lat", "1", "--lng", "2", "--address", "x"]).is_err());
        assert!(parse(&["--lat", "1"]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(parse(&["--lat", "91", "--lng", "0"]).is_err());
        assert!(parse(&["--fov", "150"]).is_err());
        assert!(parse(&["--fov", "0"]).is_err());
        assert!(parse(&["--radius", "0"]).is_err());
        assert!(parse(&["--size", "wide"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--quality", "0"]).is_err());
        assert!(parse(&["--quality", "101"]).is_err());
        assert!(parse(&["--quality", "300"]).is_err());
    }

    #[test]
    fn test_url_report_labels_image_as_placed_at_target() {
        let client = StreetView::with_api_key("k");
        let target = Target::coordinates(1.0, 2.0);
        let report = url_report(&client, &target, &ParameterOverrides::new()).unwrap();

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("metadata:        https://"));
        assert!(lines[1].starts_with("image at target: https://"));
        assert!(lines[1].contains("location=1%2C2"));
        assert!(lines[2].contains("only known after the metadata lookup"));
    }

    #[test]
    fn test_url_report_without_note_when_heading_is_fixed() {
        let client = StreetView::with_api_key("k");
        let target = Target::coordinates(1.0, 2.0);
        let overrides = ParameterOverrides::new().heading(45.0);
        let report = url_report(&client, &target, &overrides).unwrap();

        assert_eq!(report.lines().count(), 2);
        assert!(report.contains("heading=45"));

        let address = Target::address("Main St");
        let report = url_report(&client, &address, &ParameterOverrides::new()).unwrap();
        assert_eq!(report.lines().count(), 2);
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(186.0).unwrap(), 186.0);
        assert_eq!(normalize_heading(360.0).unwrap(), 0.0);
        assert_eq!(normalize_heading(-90.0).unwrap(), 270.0);
        assert!(normalize_heading(f64::NAN).is_err());
    }
}
