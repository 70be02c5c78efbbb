use crate::domain::error::GeofenceError;
use crate::domain::geo::distance_meters;
use crate::model::site::{Site, SiteKind};

/// A device position fix in WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
}

/// The nearest eligible site for a fix, with the geodesic distance to it.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub site: &'a Site,
    pub distance_m: f64,
}

/// A site with a non-positive or non-finite radius, non-finite coordinates,
/// or an unrecognized kind can never validate a check-in.
fn eligible(site: &Site) -> bool {
    site.radius_m.is_finite()
        && site.radius_m > 0.0
        && site.latitude.is_finite()
        && site.longitude.is_finite()
        && site.kind().is_some()
}

/// Nearest eligible site by haversine distance.
///
/// Equidistant sites tie-break on the lowest id, so the result does not
/// depend on the order the registry returned them in.
pub fn nearest_site<'a>(fix: &Fix, sites: &'a [Site]) -> Option<Resolution<'a>> {
    let mut best: Option<Resolution<'a>> = None;

    for site in sites.iter().filter(|s| eligible(s)) {
        let d = distance_meters(fix.lat, fix.lon, site.latitude, site.longitude);
        let closer = match &best {
            None => true,
            Some(b) => d < b.distance_m || (d == b.distance_m && site.id < b.site.id),
        };
        if closer {
            best = Some(Resolution { site, distance_m: d });
        }
    }

    best
}

/// Geofence verdict for a fix against a candidate site set.
///
/// Pure decision function: nothing is recorded here. `required_kind`
/// constrains what the *nearest* site must be (ordinary check-in demands
/// `Fixed`; duty-travel check-in passes `None` because its candidate set is
/// already scoped to the assignment).
pub fn validate<'a>(
    fix: &Fix,
    sites: &'a [Site],
    required_kind: Option<SiteKind>,
) -> Result<Resolution<'a>, GeofenceError> {
    if !fix.lat.is_finite() || !fix.lon.is_finite() {
        return Err(GeofenceError::Undetectable);
    }

    let resolved = nearest_site(fix, sites).ok_or(GeofenceError::Undetectable)?;

    if let Some(required) = required_kind {
        if resolved.site.kind() != Some(required) {
            return Err(GeofenceError::WrongLocationType);
        }
    }

    if resolved.distance_m > resolved.site.radius_m {
        return Err(GeofenceError::OutOfRange {
            distance_m: resolved.distance_m.round() as i64,
            radius_m: resolved.site.radius_m.round() as i64,
            site_name: resolved.site.name.clone(),
        });
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: u64, lat: f64, lon: f64, radius_m: f64, kind: &str) -> Site {
        Site {
            id,
            name: format!("Site {id}"),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            radius_m,
            kind: kind.to_string(),
            status: "active".to_string(),
        }
    }

    #[test]
    fn no_sites_is_undetectable() {
        let fix = Fix { lat: -6.2, lon: 106.816 };
        let verdict = validate(&fix, &[], Some(SiteKind::Fixed));
        assert_eq!(verdict.unwrap_err(), GeofenceError::Undetectable);
    }

    #[test]
    fn within_radius_of_single_fixed_site() {
        let sites = vec![site(1, -6.2000, 106.8160, 100.0, "fixed")];
        let fix = Fix { lat: -6.2005, lon: 106.8165 };

        let resolved = validate(&fix, &sites, Some(SiteKind::Fixed)).unwrap();
        assert_eq!(resolved.site.id, 1);
        assert!(resolved.distance_m <= 100.0);
    }

    #[test]
    fn out_of_range_message_carries_rounded_distance() {
        let sites = vec![site(1, -6.2000, 106.8160, 100.0, "fixed")];
        // ~500 m due north of the site
        let fix = Fix { lat: -6.1955, lon: 106.8160 };

        let err = validate(&fix, &sites, Some(SiteKind::Fixed)).unwrap_err();
        assert_eq!(err.code(), "out_of_range");
        assert!(err.to_string().contains("500"), "message was {err}");
    }

    #[test]
    fn nearest_travel_site_is_wrong_kind_for_ordinary_check_in() {
        let sites = vec![
            site(1, -6.2000, 106.8160, 100.0, "travel"),
            site(2, -6.3000, 106.9000, 100.0, "fixed"),
        ];
        let fix = Fix { lat: -6.2001, lon: 106.8161 };

        let err = validate(&fix, &sites, Some(SiteKind::Fixed)).unwrap_err();
        assert_eq!(err, GeofenceError::WrongLocationType);
    }

    #[test]
    fn equidistant_sites_tie_break_on_lowest_id() {
        // Same coordinates, so both are exactly 0 m away.
        let sites = vec![
            site(7, -6.2, 106.816, 50.0, "fixed"),
            site(3, -6.2, 106.816, 50.0, "fixed"),
        ];
        let fix = Fix { lat: -6.2, lon: 106.816 };

        let resolved = nearest_site(&fix, &sites).unwrap();
        assert_eq!(resolved.site.id, 3);
    }

    #[test]
    fn malformed_sites_are_ineligible() {
        let sites = vec![
            site(1, -6.2, 106.816, 0.0, "fixed"),        // zero radius
            site(2, f64::NAN, 106.816, 100.0, "fixed"),  // bad coordinate
            site(3, -6.2, 106.816, 100.0, "kantor"),     // unknown kind
        ];
        let fix = Fix { lat: -6.2, lon: 106.816 };

        assert!(nearest_site(&fix, &sites).is_none());
        let verdict = validate(&fix, &sites, Some(SiteKind::Fixed));
        assert_eq!(verdict.unwrap_err(), GeofenceError::Undetectable);
    }

    #[test]
    fn nearest_wins_over_farther_in_range_site() {
        // Fix is inside site 2's radius but site 1 is nearer and too small.
        let sites = vec![
            site(1, -6.2000, 106.8160, 10.0, "fixed"),
            site(2, -6.2010, 106.8170, 500.0, "fixed"),
        ];
        let fix = Fix { lat: -6.2003, lon: 106.8163 };

        let err = validate(&fix, &sites, Some(SiteKind::Fixed)).unwrap_err();
        assert!(matches!(err, GeofenceError::OutOfRange { .. }));
    }
}
