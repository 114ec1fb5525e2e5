//! The URL table.
//!
//! Order matters: resolution walks the table top to bottom and the first
//! enabled match wins. `processedvideo/` is declared but disabled by default.

use crate::config::{MediaConfig, RoutesConfig};
use crate::routing::{Route, RouteError, RouteTable};
use crate::views::View;

/// Every route name declared below, in declaration order.
pub const ROUTE_NAMES: &[&str] = &[
    "home",
    "video_feed",
    "process_frame",
    "dehaze_image",
    "upload_video",
    "get_processed_video",
    "location_data",
    "media",
];

/// Build the route table, applying the configured toggles.
pub fn urlpatterns(
    routes: &RoutesConfig,
    media: &MediaConfig,
) -> Result<RouteTable<View>, RouteError> {
    let table = RouteTable::new(vec![
        Route::new("", View::Home, "home")?,
        Route::new("video_feed/", View::VideoFeed, "video_feed")?,
        Route::new("process_frame/", View::ProcessFrame, "process_frame")?,
        Route::new("dehaze/", View::DehazeImageUpload, "dehaze_image")?,
        Route::new("uploadvideo/", View::UploadVideo, "upload_video")?,
        Route::new("processedvideo/", View::GetProcessedVideo, "get_processed_video")?,
        Route::new("location_data/", View::LocationData, "location_data")?,
        Route::new("media/<uuid:id>/", View::Media, "media")?,
    ])?;

    let mut disabled: Vec<&str> = routes.disabled.iter().map(String::as_str).collect();
    if !media.serve {
        disabled.push("media");
    }
    table.with_disabled(&disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Params;

    fn default_table() -> RouteTable<View> {
        urlpatterns(&RoutesConfig::default(), &MediaConfig::default()).unwrap()
    }

    #[test]
    fn test_declared_paths_resolve_to_named_views() {
        let table = default_table();
        let expected = [
            ("/", View::Home, "home"),
            ("/video_feed/", View::VideoFeed, "video_feed"),
            ("/process_frame/", View::ProcessFrame, "process_frame"),
            ("/dehaze/", View::DehazeImageUpload, "dehaze_image"),
            ("/uploadvideo/", View::UploadVideo, "upload_video"),
            ("/location_data/", View::LocationData, "location_data"),
        ];
        for (path, view, name) in expected {
            let m = table.resolve(path).unwrap_or_else(|| panic!("{path} did not resolve"));
            assert_eq!(*m.handler, view);
            assert_eq!(m.name, name);
        }
    }

    #[test]
    fn test_processed_video_disabled_by_default() {
        let table = default_table();
        assert!(table.resolve("/processedvideo/").is_none());
        assert!(!table.get("get_processed_video").unwrap().is_enabled());
    }

    #[test]
    fn test_names_match_declaration_order() {
        let table = default_table();
        let names: Vec<&str> = table.iter().map(|r| r.name()).collect();
        assert_eq!(names, ROUTE_NAMES);
    }

    #[test]
    fn test_unmatched_paths() {
        let table = default_table();
        for path in ["/nope/", "/video_feed/extra/", "/dehaze/x", "/admin/"] {
            assert!(table.resolve(path).is_none(), "{path} unexpectedly resolved");
        }
    }

    #[test]
    fn test_toggles() {
        let routes = RoutesConfig {
            disabled: vec!["home".into()],
            append_slash: true,
        };
        let media = MediaConfig {
            serve: false,
            ..MediaConfig::default()
        };
        let table = urlpatterns(&routes, &media).unwrap();
        assert!(table.resolve("/").is_none());
        assert!(table.resolve("/processedvideo/").is_some());
        assert!(table
            .resolve("/media/67e55044-10b1-426f-9247-bb680e5fe0c8/")
            .is_none());
    }

    #[test]
    fn test_reverse_names() {
        let table = default_table();
        assert_eq!(table.reverse("dehaze_image", &Params::new()).unwrap(), "/dehaze/");
        assert_eq!(table.reverse("upload_video", &Params::new()).unwrap(), "/uploadvideo/");
        assert!(table.reverse("get_processed_video", &Params::new()).is_err());
    }
}
