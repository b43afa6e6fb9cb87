//! Regex-based framework detection across the supported web ecosystems.
//! Every extractor here is intentionally a single regex pass over raw
//! source text rather than an AST walk: frameworks are detected by textual
//! convention (attributes, decorators, chained calls), not by a single
//! grammar shape shared across languages.

use crate::framework::normalize::normalize_endpoint_path;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointMatch {
    pub framework: String,
    pub method: String,
    pub path: String,
    pub handler_name: Option<String>,
    pub controller_name: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl EndpointMatch {
    fn new(framework: &str, method: &str, path: &str) -> Self {
        Self {
            framework: framework.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            handler_name: None,
            controller_name: None,
            metadata: HashMap::new(),
        }
    }

    pub fn qualified_name(&self, project: &str, env_file_vars: &HashMap<String, String>) -> String {
        let normalized = normalize_endpoint_path(&self.path, env_file_vars);
        format!(
            "{}.endpoint.{}.{}:{}",
            project,
            self.framework,
            self.method.to_uppercase(),
            normalized
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiBinding {
    pub framework: String,
    pub consumer: String,
    pub provider: String,
}

fn join_paths(prefix: &str, suffix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if prefix.is_empty() {
        format!("/{}", suffix)
    } else {
        format!("{}/{}", prefix, suffix)
    }
}

macro_rules! re {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

// --- ASP.NET Core ---------------------------------------------------------

re!(
    cs_class,
    r#"(?is)(?:\[\s*Route\s*\(\s*"(?P<route>[^"]+)"\s*\)\s*\])?\s*(?:public\s+)?class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*[A-Za-z0-9_.]+Controller"#
);
re!(
    cs_http_method,
    r#"(?is)\[\s*Http(?P<method>Get|Post|Put|Delete|Patch|Options|Head)\s*(?:\(\s*"(?P<path>[^"]*)"\s*\))?\s*\][\s\S]{0,200}?\b(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\("#
);
re!(
    cs_minimal,
    r#"(?i)\.Map(?P<method>Get|Post|Put|Delete|Patch)\s*\(\s*"(?P<path>[^"]+)"\s*,\s*(?P<handler>[A-Za-z_][A-Za-z0-9_.]+)"#
);

/// ASP.NET Core controller attributes (`[HttpGet]`, `[Route]`) plus minimal-API `.MapGet`.
pub fn extract_csharp_endpoints(source: &str) -> Vec<EndpointMatch> {
    let mut endpoints = Vec::new();

    let class_matches: Vec<_> = cs_class().captures_iter(source).collect();
    for (idx, m) in class_matches.iter().enumerate() {
        let start = m.get(0).unwrap().start();
        let end = class_matches
            .get(idx + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(source.len());
        let name = &m["name"];
        let route_prefix = m
            .name("route")
            .map(|r| r.as_str().replace("[controller]", &name.replace("Controller", "").to_lowercase()))
            .unwrap_or_default();
        let block = &source[start..end.max(start)];

        for hm in cs_http_method().captures_iter(block) {
            let method = hm["method"].to_uppercase();
            let path = hm.name("path").map(|p| p.as_str()).unwrap_or("");
            let mut endpoint = EndpointMatch::new("aspnet", &method, &join_paths(&route_prefix, path));
            endpoint.handler_name = Some(hm["name"].to_string());
            endpoint.controller_name = Some(name.to_string());
            endpoints.push(endpoint);
        }
    }

    for m in cs_minimal().captures_iter(source) {
        let method = m["method"].to_uppercase();
        let handler = &m["handler"];
        let mut endpoint = EndpointMatch::new("aspnet", &method, &m["path"]);
        endpoint.handler_name = Some(handler.rsplit('.').next().unwrap_or(handler).to_string());
        endpoints.push(endpoint);
    }

    endpoints
}

// --- Go web frameworks (Gin/Echo/Fiber/Chi) -------------------------------

re!(
    go_group,
    r#"(?i)(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*:=\s*\w+\.Group\(\s*"(?P<prefix>[^"]+)""#
);
re!(
    go_chained_group,
    r#"(?i)\.Group\(\s*"(?P<prefix>[^"]+)"\s*\)\s*\.\s*(?P<method>GET|POST|PUT|DELETE|PATCH)\s*\(\s*"(?P<path>[^"]+)"\s*,\s*(?P<handler>[A-Za-z_][A-Za-z0-9_.]+)"#
);
re!(
    go_route,
    r#"(?i)(?P<prefix>[A-Za-z_][A-Za-z0-9_]*)?\.?\s*(?P<method>GET|POST|PUT|DELETE|PATCH)\s*\(\s*"(?P<path>[^"]+)"\s*,\s*(?P<handler>[A-Za-z_][A-Za-z0-9_.]+)"#
);

pub fn extract_go_endpoints(source: &str) -> Vec<EndpointMatch> {
    let mut endpoints = Vec::new();
    let mut groups: HashMap<String, String> = HashMap::new();
    for m in go_group().captures_iter(source) {
        groups.insert(m["name"].to_string(), m["prefix"].to_string());
    }

    for m in go_chained_group().captures_iter(source) {
        let handler = &m["handler"];
        let path = join_paths(&m["prefix"], &m["path"]);
        let mut endpoint = EndpointMatch::new("go_web", &m["method"].to_uppercase(), &path);
        endpoint.handler_name = Some(handler.rsplit('.').next().unwrap_or(handler).to_string());
        endpoints.push(endpoint);
    }

    for m in go_route().captures_iter(source) {
        let handler = &m["handler"];
        let mut path = m["path"].to_string();
        if let Some(prefix_name) = m.name("prefix").map(|p| p.as_str()) {
            if let Some(prefix) = groups.get(prefix_name) {
                path = join_paths(prefix, &path);
            }
        }
        let mut endpoint = EndpointMatch::new("go_web", &m["method"].to_uppercase(), &path);
        endpoint.handler_name = Some(handler.rsplit('.').next().unwrap_or(handler).to_string());
        endpoints.push(endpoint);
    }
    endpoints
}

// --- PHP (Laravel / Symfony) ----------------------------------------------

re!(
    php_route_array,
    r#"(?i)Route::(?P<method>get|post|put|patch|delete|options|any)\s*\(\s*['"](?P<path>[^'"]+)['"]\s*,\s*\[(?P<controller>[A-Za-z_][A-Za-z0-9_]*)::class\s*,\s*['"](?P<action>[A-Za-z_][A-Za-z0-9_]*)['"]\]\s*\)"#
);
re!(
    php_route_at,
    r#"(?i)Route::(?P<method>get|post|put|patch|delete|options|any)\s*\(\s*['"](?P<path>[^'"]+)['"]\s*,\s*['"](?P<controller>[A-Za-z_][A-Za-z0-9_]*)@(?P<action>[A-Za-z_][A-Za-z0-9_]*)['"]\s*\)"#
);
re!(
    symfony_route,
    r#"(?is)#\[Route\(\s*['"](?P<path>[^'"]+)['"](?:[^\]]*methods:\s*\[(?P<methods>[^\]]*)\])?"#
);

pub fn extract_php_endpoints(source: &str) -> Vec<EndpointMatch> {
    let mut endpoints = Vec::new();

    for m in php_route_array().captures_iter(source) {
        let mut endpoint = EndpointMatch::new("laravel", &m["method"].to_uppercase(), &m["path"]);
        endpoint.handler_name = Some(m["action"].to_string());
        endpoint.controller_name = Some(m["controller"].to_string());
        endpoints.push(endpoint);
    }

    for m in php_route_at().captures_iter(source) {
        let mut endpoint = EndpointMatch::new("laravel", &m["method"].to_uppercase(), &m["path"]);
        endpoint.handler_name = Some(m["action"].to_string());
        endpoint.controller_name = Some(m["controller"].to_string());
        endpoints.push(endpoint);
    }

    for m in symfony_route().captures_iter(source) {
        let path = &m["path"];
        let methods: Vec<&str> = m
            .name("methods")
            .map(|raw| raw.as_str().split(',').map(|t| t.trim().trim_matches(|c| c == '\'' || c == '"')).filter(|t| !t.is_empty()).collect())
            .filter(|v: &Vec<&str>| !v.is_empty())
            .unwrap_or_else(|| vec!["GET"]);
        for method in methods {
            endpoints.push(EndpointMatch::new("symfony", &method.to_uppercase(), path));
        }
    }

    endpoints
}

// --- HTMX ------------------------------------------------------------------

re!(
    htmx_element,
    r#"(?i)<[^>]*\bhx-(get|post|put|delete|patch)\s*=\s*['"](?P<path>[^'"]+)['"][^>]*>"#
);

fn html_attribute(text: &str, attr_name: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r#"(?i){}\s*=\s*['"]([^'"]+)['"]"#, regex::escape(attr_name))).unwrap();
    pattern.captures(text).map(|c| c[1].to_string())
}

/// HTMX request attributes (`hx-get`, `hx-post`, ...) on an HTML/template element.
pub fn extract_htmx_endpoints(source: &str) -> Vec<EndpointMatch> {
    let mut endpoints = Vec::new();
    for m in htmx_element().captures_iter(source) {
        let whole = m.get(0).unwrap().as_str();
        let method = m[1].to_uppercase();
        let mut endpoint = EndpointMatch::new("htmx", &method, &m["path"]);
        for (key, attr) in [("trigger", "hx-trigger"), ("target", "hx-target"), ("swap", "hx-swap")] {
            if let Some(value) = html_attribute(whole, attr) {
                endpoint.metadata.insert(key.to_string(), value);
            }
        }
        endpoints.push(endpoint);
    }
    endpoints
}

// --- Next.js ---------------------------------------------------------------

re!(
    next_route_export,
    r#"(?i)export\s+async\s+function\s+(GET|POST|PUT|DELETE|PATCH)|export\s+function\s+(GET|POST|PUT|DELETE|PATCH)"#
);

/// Pages Router (`pages/api/**`) and App Router (`app/api/**/route.ts`) API endpoints.
pub fn extract_next_endpoints(file_path: &str, source: &str) -> Vec<EndpointMatch> {
    let normalized = file_path.replace('\\', "/");
    let mut endpoints = Vec::new();

    if let Some(rest) = normalized.split("/pages/api/").nth(1) {
        let mut route = rest.rsplit_once('.').map(|(base, _)| base).unwrap_or(rest).to_string();
        if let Some(stripped) = route.strip_suffix("/index") {
            route = stripped.to_string();
        }
        let api_path = if route.is_empty() { "/api".to_string() } else { format!("/api/{}", route) };
        let mut endpoint = EndpointMatch::new("next", "ALL", &api_path);
        endpoint.handler_name = Some("handler".to_string());
        endpoints.push(endpoint);
        return endpoints;
    }

    if normalized.contains("/app/api/")
        && (normalized.ends_with("/route.ts") || normalized.ends_with("/route.js") || normalized.ends_with("/route.tsx") || normalized.ends_with("/route.jsx"))
    {
        let rest = normalized.split("/app/api/").nth(1).unwrap_or("");
        let route = rest
            .replace("/route.ts", "")
            .replace("/route.js", "")
            .replace("/route.tsx", "")
            .replace("/route.jsx", "");
        let api_path = if route.is_empty() { "/api".to_string() } else { format!("/api/{}", route) };
        let methods: Vec<String> = next_route_export()
            .captures_iter(source)
            .filter_map(|m| m.get(1).or_else(|| m.get(2)).map(|g| g.as_str().to_uppercase()))
            .collect();
        let methods = if methods.is_empty() { vec!["ALL".to_string()] } else { methods };
        for method in methods {
            let handler_name = if method != "ALL" { Some(method.clone()) } else { None };
            let mut endpoint = EndpointMatch::new("next", &method, &api_path);
            endpoint.handler_name = handler_name;
            endpoints.push(endpoint);
        }
    }

    endpoints
}

// --- Dependency injection (Spring / NestJS) --------------------------------

re!(
    spring_provider,
    r"(?m)@(?:Service|Component|Repository|Controller|RestController)\s*[\r\n]+\s*(?:public\s+)?class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)"
);
re!(
    spring_bean,
    r"(?m)@Bean[\s\r\n]+(?:public\s+)?(?P<type>[A-Za-z_][A-Za-z0-9_<>.]+)\s+[A-Za-z_][A-Za-z0-9_]*\s*\("
);
re!(spring_class, r"(?m)class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)");
re!(
    spring_ctor,
    r"(?m)public\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<args>[^)]*)\)"
);

fn last_token(type_text: &str) -> String {
    type_text
        .trim()
        .split('<')
        .next()
        .unwrap_or(type_text)
        .rsplit('.')
        .next()
        .unwrap_or(type_text)
        .to_string()
}

/// Spring Boot `@Autowired`-style constructor injection: providers come from
/// `@Service`/`@Component`/`@Bean`, consumers from constructors whose
/// parameter types match a provider.
pub fn link_spring_di(source: &str) -> Vec<DiBinding> {
    let mut providers: HashSet<String> = spring_provider().captures_iter(source).map(|m| m["name"].to_string()).collect();
    providers.extend(spring_bean().captures_iter(source).map(|m| last_token(&m["type"])));
    if providers.is_empty() {
        return Vec::new();
    }

    let classes: HashSet<&str> = spring_class().captures_iter(source).map(|m| m.name("name").unwrap().as_str()).collect();
    let mut bindings = Vec::new();
    for ctor in spring_ctor().captures_iter(source) {
        let class_name = &ctor["name"];
        if !classes.contains(class_name) {
            continue;
        }
        for token in ctor["args"].split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let dep_type = last_token(token.split_whitespace().next().unwrap_or(token));
            if providers.contains(&dep_type) {
                bindings.push(DiBinding { framework: "spring".to_string(), consumer: class_name.to_string(), provider: dep_type });
            }
        }
    }
    bindings
}

re!(
    nest_provider,
    r"(?s)@Injectable\(.*?\)\s*export\s+class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)"
);
re!(
    nest_controller,
    r"(?s)@Controller\(.*?\)\s*export\s+class\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)"
);
re!(nest_module, r"(?s)@Module\(\s*\{(?P<body>[^}]+)\}\s*\)");
re!(nest_providers_list, r"(?s)providers\s*:\s*\[(?P<providers>[^\]]+)\]");
re!(nest_ctor, r"(?s)constructor\s*\((?P<args>[^)]*)\)");

/// NestJS `@Injectable`/`@Controller` constructor injection.
pub fn link_nest_di(source: &str) -> Vec<DiBinding> {
    let mut providers: HashSet<String> = nest_provider().captures_iter(source).map(|m| m["name"].to_string()).collect();
    for module_match in nest_module().captures_iter(source) {
        if let Some(providers_match) = nest_providers_list().captures(&module_match["body"]) {
            for token in providers_match["providers"].split(',') {
                let name = token.trim().split('{').next().unwrap_or("").trim();
                if !name.is_empty() {
                    providers.insert(name.to_string());
                }
            }
        }
    }

    let consumers: Vec<&str> = nest_controller().captures_iter(source).map(|m| m.name("name").unwrap().as_str()).collect();
    if providers.is_empty() || consumers.is_empty() {
        return Vec::new();
    }

    let mut bindings = Vec::new();
    for consumer in &consumers {
        for ctor in nest_ctor().captures_iter(source) {
            for token in ctor["args"].split(',') {
                let token = token.trim();
                if token.is_empty() {
                    continue;
                }
                let dep_type = token.split(':').last().unwrap_or("").split('|').next().unwrap_or("").trim();
                if providers.contains(dep_type) {
                    bindings.push(DiBinding { framework: "nestjs".to_string(), consumer: consumer.to_string(), provider: dep_type.to_string() });
                }
            }
        }
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_aspnet_controller_endpoint_with_route_prefix() {
        let src = r#"
[Route("api/[controller]")]
public class UsersController : ControllerBase {
    [HttpGet("{id}")]
    public IActionResult GetById(int id) { return Ok(); }
}
"#;
        let endpoints = extract_csharp_endpoints(src);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].method, "GET");
        assert_eq!(endpoints[0].path, "/api/users/{id}");
        assert_eq!(endpoints[0].handler_name.as_deref(), Some("GetById"));
    }

    #[test]
    fn extracts_go_chi_group_endpoint() {
        let src = r#"r.Group("/api").GET("/users", handlers.ListUsers)"#;
        let endpoints = extract_go_endpoints(src);
        assert!(endpoints.iter().any(|e| e.path == "/api/users" && e.method == "GET"));
    }

    #[test]
    fn extracts_laravel_array_route() {
        let src = r#"Route::get('/users/{id}', [UserController::class, 'show']);"#;
        let endpoints = extract_php_endpoints(src);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].controller_name.as_deref(), Some("UserController"));
        assert_eq!(endpoints[0].handler_name.as_deref(), Some("show"));
    }

    #[test]
    fn extracts_htmx_trigger_metadata() {
        let src = r##"<button hx-get="/search" hx-trigger="keyup changed delay:500ms" hx-target="#results">Go</button>"##;
        let endpoints = extract_htmx_endpoints(src);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].metadata.get("target").map(|s| s.as_str()), Some("#results"));
    }

    #[test]
    fn extracts_next_app_router_endpoint() {
        let src = "export async function GET(request) { return Response.json({}); }";
        let endpoints = extract_next_endpoints("/repo/app/api/users/route.ts", src);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/api/users");
        assert_eq!(endpoints[0].method, "GET");
    }

    #[test]
    fn extracts_next_pages_router_index_endpoint() {
        let endpoints = extract_next_endpoints("/repo/pages/api/users/index.ts", "");
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/api/users");
        assert_eq!(endpoints[0].method, "ALL");
    }

    #[test]
    fn links_spring_constructor_injection() {
        let src = r#"
@Service
class UserService {
}

class UserController {
    public UserController(UserService userService) {
    }
}
"#;
        let bindings = link_spring_di(src);
        assert!(bindings.iter().any(|b| b.consumer == "UserController" && b.provider == "UserService"));
    }

    #[test]
    fn links_nest_constructor_injection() {
        let src = r#"
@Injectable()
export class UsersService {}

@Controller('users')
export class UsersController {
    constructor(usersService: UsersService) {}
}
"#;
        let bindings = link_nest_di(src);
        assert!(bindings.iter().any(|b| b.consumer == "UsersController" && b.provider == "UsersService"));
    }
}
