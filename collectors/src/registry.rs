//! Per-request registry plumbing.
//!
//! Every scrape builds a fresh registry so that stale series from earlier
//! requests can never leak into the response.

use prometheus::{Gauge, GaugeVec, Opts, Registry, TextEncoder};

use crate::error::Result;

/// MIME type of the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

pub(crate) fn gauge(registry: &Registry, name: &str, help: &str, chain_id: &str) -> Result<Gauge> {
    let gauge = Gauge::with_opts(opts(name, help, chain_id))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

pub(crate) fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    chain_id: &str,
) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(opts(name, help, chain_id), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Encodes everything gathered so far into the text exposition format.
pub(crate) fn render(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&registry.gather())?)
}

fn opts(name: &str, help: &str, chain_id: &str) -> Opts {
    Opts::new(name, help).const_label("chain_id", chain_id)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn chain_id_is_a_const_label_on_every_family() {
        let registry = Registry::new();
        let plain = gauge(&registry, "demo_total", "demo", "test-1").unwrap();
        plain.set(4.0);
        let vec = gauge_vec(&registry, "demo_by_denom", "demo", &["denom"], "test-1").unwrap();
        vec.with_label_values(&["uatom"]).set(2.0);

        let body = render(&registry).unwrap();
        assert!(body.contains(r#"demo_total{chain_id="test-1"} 4"#), "{body}");
        assert!(
            body.contains(r#"demo_by_denom{chain_id="test-1",denom="uatom"} 2"#),
            "{body}"
        );
    }

    #[test]
    fn empty_vec_families_render_no_samples() {
        let registry = Registry::new();
        let _vec = gauge_vec(&registry, "demo_by_denom", "demo", &["denom"], "test-1").unwrap();
        let body = render(&registry).unwrap();
        assert_eq!(body, "");
    }
}
