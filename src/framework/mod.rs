//! Framework-aware extraction: web endpoints, dependency injection, Tailwind
//! utilities, and Django/Jinja templates.

pub mod django_template;
pub mod linker;
pub mod normalize;
pub mod tailwind;

pub use django_template::{build_template_index, looks_like_template, parse_template, TemplateExtraction};
pub use linker::{
    extract_csharp_endpoints, extract_go_endpoints, extract_htmx_endpoints, extract_next_endpoints,
    extract_php_endpoints, link_nest_di, link_spring_di, DiBinding, EndpointMatch,
};
pub use normalize::{endpoint_qn, normalize_endpoint_path};
pub use tailwind::{scan_markup, scan_stylesheet, CssRuleResult};
