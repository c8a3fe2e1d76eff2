//! Logic skeletons: one Go source file per RPC of a definition file, chosen by naming convention.

use crate::case::{first_lower, to_snake_case, to_upper_camel_case};
use crate::dispatch::{base_type, classify, resolve_primary_key, CrudKind, PrimaryKey};
use crate::error::GenError;
use crate::schema::{DefinitionFile, RpcMethod, ServiceBlock};
use crate::store::SchemaSource;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Package qualifier of generated request/response types.
pub const PROTO_PACKAGE: &str = "proto";

const ERROR_IMPORT: &str = "\"comm/errorm\"";
const SQLC_IMPORT: &str = "\"github.com/zeromicro/go-zero/core/stores/sqlc\"";
const UTIL_IMPORT: &str = "\"comm/util\"";

pub type Vars = BTreeMap<&'static str, String>;

/// Renders a template against named variables.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, vars: &Vars) -> Result<String, GenError>;
}

/// Substitutes `{{.name}}` placeholders. A placeholder without a bound variable is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderEngine;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*\.(\w+)\s*\}\}").expect("static regex"))
}

impl TemplateEngine for PlaceholderEngine {
    fn render(&self, template: &str, vars: &Vars) -> Result<String, GenError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in placeholder_re().captures_iter(template) {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let name = &caps[1];
            let value = vars
                .get(name)
                .ok_or_else(|| GenError::Template(format!("unknown placeholder `{}`", name)))?;
            out.push_str(&template[last..whole.start]);
            out.push_str(value);
            last = whole.end;
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

const FILE_TEMPLATE: &str = "package logic

import (
\t\"context\"

{{.imports}}

\t\"github.com/zeromicro/go-zero/core/logx\"
)

type {{.logicName}} struct {
\tctx    context.Context
\tsvcCtx *svc.ServiceContext
\tlogx.Logger
}

func New{{.logicName}}(ctx context.Context, svcCtx *svc.ServiceContext) *{{.logicName}} {
\treturn &{{.logicName}}{
\t\tctx:    ctx,
\t\tsvcCtx: svcCtx,
\t\tLogger: logx.WithContext(ctx),
\t}
}

{{.functions}}";

const GENERIC_TEMPLATE: &str = "{{.comment}}func (l *{{.logicName}}) {{.method}}({{.params}}) ({{.results}}) {
\t// todo: add your logic here and delete this line

\treturn {{.returnValue}}
}
";

const CREATE_TEMPLATE: &str = "{{.comment}}func (l *{{.logicName}}) {{.method}}(in {{.request}}) ({{.response}}, error) {
\tdata := &model.{{.modelName}}{}
\tresult, err := l.svcCtx.{{.modelName}}Model.Insert(l.ctx, data)
\tif err != nil && err != sqlc.ErrNotFound {
\t\treturn nil, errorm.New(errorm.DBError, err.Error())
\t}
\tid, _ := result.LastInsertId()

\treturn &{{.responseType}}{ {{.pK}}: id }, nil
}
";

const DELETE_TEMPLATE: &str = "{{.comment}}func (l *{{.logicName}}) {{.method}}(in {{.request}}) ({{.response}}, error) {
\tif in.{{.pK}} == {{.pV}} {
\t\treturn nil, errorm.New(errorm.ParamError, \"{{.pK}} is required\")
\t}
\tif err := l.svcCtx.{{.modelName}}Model.Delete(l.ctx, in.{{.pK}}); err != nil && err != model.ErrNotFound {
\t\treturn nil, errorm.New(errorm.DBError, err.Error())
\t}

\treturn &{{.responseType}}{}, nil
}
";

const QUERY_DETAIL_TEMPLATE: &str = "{{.comment}}func (l *{{.logicName}}) {{.method}}(in {{.request}}) ({{.response}}, error) {
\t{{.modelNameFirstLower}}, err := l.svcCtx.{{.modelName}}Model.FindOne(l.ctx, in.{{.pK}})
\tif err == model.ErrNotFound {
\t\treturn &{{.responseType}}{}, nil
\t}
\tif err != nil {
\t\treturn nil, errorm.New(errorm.DBError, err.Error())
\t}

\treturn &{{.responseType}}{ {{.modelName}}: {{.modelNameFirstLower}} }, nil
}
";

const QUERY_LIST_TEMPLATE: &str = "{{.comment}}func (l *{{.logicName}}) {{.method}}(in {{.request}}) ({{.response}}, error) {
\tlist, total, err := l.svcCtx.{{.modelName}}Model.FindList(l.ctx, in)
\tif err != nil && err != model.ErrNotFound {
\t\treturn nil, errorm.New(errorm.DBError, err.Error())
\t}
\tresp := &{{.responseType}}{Total: total}
\tif err := util.Copy(&resp.List, list); err != nil {
\t\treturn nil, errorm.New(errorm.ServerError, err.Error())
\t}

\treturn resp, nil
}
";

const UPDATE_TEMPLATE: &str = "{{.comment}}func (l *{{.logicName}}) {{.method}}(in {{.request}}) ({{.response}}, error) {
\tif in.{{.pK}} == {{.pV}} {
\t\treturn nil, errorm.New(errorm.ParamError, \"{{.pK}} is required\")
\t}
\t{{.modelNameFirstLower}}, err := l.svcCtx.{{.modelName}}Model.FindOne(l.ctx, in.{{.pK}})
\tif err == sqlc.ErrNotFound {
\t\treturn nil, errorm.New(errorm.NotFound, \"{{.modelName}} not found\")
\t}
\tif err != nil {
\t\treturn nil, errorm.New(errorm.DBError, err.Error())
\t}
\tif err := util.Copy({{.modelNameFirstLower}}, in); err != nil {
\t\treturn nil, errorm.New(errorm.ServerError, err.Error())
\t}
\tif err := l.svcCtx.{{.modelName}}Model.Update(l.ctx, {{.modelNameFirstLower}}); err != nil {
\t\treturn nil, errorm.New(errorm.DBError, err.Error())
\t}

\treturn &{{.responseType}}{ {{.pK}}: in.{{.pK}} }, nil
}
";

/// Extra packages a function body needs beyond the fixed set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportNeeds {
    pub sqlc: bool,
    pub util: bool,
    pub model: bool,
}

fn template_for(kind: CrudKind) -> (&'static str, ImportNeeds) {
    match kind {
        CrudKind::Create => (
            CREATE_TEMPLATE,
            ImportNeeds {
                sqlc: true,
                util: false,
                model: true,
            },
        ),
        CrudKind::Delete => (
            DELETE_TEMPLATE,
            ImportNeeds {
                model: true,
                ..Default::default()
            },
        ),
        CrudKind::QueryDetail => (
            QUERY_DETAIL_TEMPLATE,
            ImportNeeds {
                model: true,
                ..Default::default()
            },
        ),
        CrudKind::QueryList => (
            QUERY_LIST_TEMPLATE,
            ImportNeeds {
                sqlc: false,
                util: true,
                model: true,
            },
        ),
        CrudKind::Update => (
            UPDATE_TEMPLATE,
            ImportNeeds {
                sqlc: true,
                util: true,
                model: true,
            },
        ),
        CrudKind::Unclassified => (GENERIC_TEMPLATE, ImportNeeds::default()),
    }
}

/// Rendered function body for one RPC plus what it imports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicFunction {
    pub kind: CrudKind,
    pub body: String,
    pub needs: ImportNeeds,
}

pub fn logic_name(rpc: &RpcMethod) -> String {
    format!("{}Logic", to_upper_camel_case(&rpc.name))
}

pub fn logic_file_name(rpc: &RpcMethod) -> String {
    format!("{}_logic.go", to_snake_case(&rpc.name))
}

fn qualified(ty: &str) -> String {
    format!("{}.{}", PROTO_PACKAGE, to_upper_camel_case(ty))
}

/// Variables bound for one RPC.
pub fn bind_vars(service: &str, rpc: &RpcMethod, kind: CrudKind, pk: &PrimaryKey) -> Vars {
    let method = to_upper_camel_case(&rpc.name);
    let request = format!("*{}", qualified(&rpc.request_type));
    let response = format!("*{}", qualified(&rpc.returns_type));
    let response_type = qualified(&rpc.returns_type);
    let model = if kind == CrudKind::Unclassified {
        String::new()
    } else {
        base_type(&rpc.request_type)
    };

    let has_req = !rpc.streams_request;
    let has_reply = !rpc.streams_request && !rpc.streams_returns;
    let stream = format!(
        "{}.{}_{}Server",
        PROTO_PACKAGE,
        to_upper_camel_case(service),
        method
    );
    let params = match (has_req, rpc.streams_returns) {
        (true, true) => format!("in {}, stream {}", request, stream),
        (true, false) => format!("in {}", request),
        (false, _) => format!("stream {}", stream),
    };
    let (results, return_value) = if has_reply {
        (format!("{}, error", response), format!("&{}{{}}, nil", response_type))
    } else {
        ("error".to_string(), "nil".to_string())
    };
    let comment: String = rpc.doc.iter().map(|l| format!("// {}\n", l)).collect();

    let mut vars = Vars::new();
    vars.insert("logicName", logic_name(rpc));
    vars.insert("method", method);
    vars.insert("request", request);
    vars.insert("response", response);
    vars.insert("responseType", response_type);
    vars.insert("pK", pk.name.clone());
    vars.insert("pV", pk.zero_value.clone());
    vars.insert("modelNameFirstLower", first_lower(&model));
    vars.insert("modelName", model);
    vars.insert("comment", comment);
    vars.insert("params", params);
    vars.insert("results", results);
    vars.insert("returnValue", return_value);
    vars
}

pub fn render_function(
    engine: &dyn TemplateEngine,
    service: &str,
    rpc: &RpcMethod,
    pk: &PrimaryKey,
) -> Result<LogicFunction, GenError> {
    let kind = classify(&rpc.name, &rpc.request_type);
    let (template, needs) = template_for(kind);
    let body = engine.render(template, &bind_vars(service, rpc, kind, pk))?;
    Ok(LogicFunction { kind, body, needs })
}

/// Sorted, de-duplicated import lines for a logic file.
pub fn imports(service: &str, svc_package: &str, needs: ImportNeeds) -> String {
    let mut set = BTreeSet::new();
    set.insert(format!("\"{}\"", svc_package));
    set.insert(format!("{} \"proto/{}\"", PROTO_PACKAGE, service));
    set.insert(ERROR_IMPORT.to_string());
    if needs.sqlc {
        set.insert(SQLC_IMPORT.to_string());
    }
    if needs.util {
        set.insert(UTIL_IMPORT.to_string());
    }
    if needs.model {
        set.insert(format!("\"{}-service/model\"", service));
    }
    set.into_iter().map(|i| format!("\t{}", i)).collect::<Vec<_>>().join("\n")
}

pub fn render_file(
    engine: &dyn TemplateEngine,
    service: &str,
    svc_package: &str,
    rpc: &RpcMethod,
    function: &LogicFunction,
) -> Result<String, GenError> {
    let mut vars = Vars::new();
    vars.insert("logicName", logic_name(rpc));
    vars.insert("imports", imports(service, svc_package, function.needs));
    vars.insert("functions", function.body.clone());
    engine.render(FILE_TEMPLATE, &vars)
}

/// Where logic files go and what they import for the service context.
#[derive(Clone, Debug)]
pub struct LogicTarget {
    pub dir: PathBuf,
    pub svc_package: String,
}

impl LogicTarget {
    pub fn new(dir: impl Into<PathBuf>, service: &str) -> Self {
        LogicTarget {
            dir: dir.into(),
            svc_package: format!("{}/internal/svc", service),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogicReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

async fn exists(path: &Path) -> Result<bool, GenError> {
    tokio::fs::try_exists(path).await.map_err(|e| GenError::io(path, e))
}

/// Writes one logic file per RPC of the first service block. Existing files are left alone.
pub async fn generate_logic<S: SchemaSource + ?Sized>(
    source: &S,
    engine: &dyn TemplateEngine,
    def: &DefinitionFile,
    target: &LogicTarget,
) -> Result<LogicReport, GenError> {
    let mut report = LogicReport::default();
    let Some(ServiceBlock { name: service, rpcs }) = def.services.first() else {
        tracing::warn!("definition file declares no service, no logic generated");
        return Ok(report);
    };
    tokio::fs::create_dir_all(&target.dir)
        .await
        .map_err(|e| GenError::io(&target.dir, e))?;

    for rpc in rpcs {
        let path = target.dir.join(logic_file_name(rpc));
        if exists(&path).await? {
            tracing::debug!(path = %path.display(), "logic file exists, skipped");
            report.skipped.push(path);
            continue;
        }
        let pk = resolve_primary_key(source, &base_type(&rpc.request_type)).await;
        let function = render_function(engine, service, rpc, &pk)?;
        let text = render_file(engine, service, &target.svc_package, rpc, &function)?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| GenError::io(&path, e))?;
        tracing::info!(path = %path.display(), kind = ?function.kind, "logic file written");
        report.written.push(path);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_definition, Column};
    use crate::store::{PrimaryKeyColumn, TableSelection};
    use async_trait::async_trait;

    fn rpc(name: &str, req: &str, resp: &str) -> RpcMethod {
        RpcMethod {
            name: name.into(),
            request_type: req.into(),
            returns_type: resp.into(),
            ..Default::default()
        }
    }

    #[test]
    fn placeholders_are_substituted() {
        let mut vars = Vars::new();
        vars.insert("name", "Order".into());
        let out = PlaceholderEngine.render("type {{.name}} struct{}; {{ .name }}", &vars).unwrap();
        assert_eq!(out, "type Order struct{}; Order");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = PlaceholderEngine.render("{{.missing}}", &Vars::new()).unwrap_err();
        assert!(matches!(err, GenError::Template(ref m) if m.contains("missing")));
    }

    #[test]
    fn crud_rpcs_pick_their_templates() {
        let pk = PrimaryKey::default();
        let f = render_function(&PlaceholderEngine, "shop", &rpc("CreateOrder", "Order", "CreateOrderResp"), &pk).unwrap();
        assert_eq!(f.kind, CrudKind::Create);
        assert!(f.needs.sqlc && f.needs.model && !f.needs.util);
        assert!(f.body.contains("l.svcCtx.OrderModel.Insert"));
        assert!(f.body.contains("return &proto.CreateOrderResp{ Id: id }, nil"));

        let f = render_function(&PlaceholderEngine, "shop", &rpc("QueryOrderDetail", "OrderFilter", "OrderDetail"), &pk).unwrap();
        assert_eq!(f.kind, CrudKind::QueryDetail);
        assert!(f.body.contains("order, err := l.svcCtx.OrderModel.FindOne(l.ctx, in.Id)"));
    }

    #[test]
    fn unclassified_rpc_uses_generic_body() {
        let mut ping = rpc("Ping", "Empty", "Pong");
        ping.doc = vec!["health check".into()];
        let f = render_function(&PlaceholderEngine, "shop", &ping, &PrimaryKey::default()).unwrap();
        assert_eq!(f.kind, CrudKind::Unclassified);
        assert_eq!(f.needs, ImportNeeds::default());
        assert!(f.body.starts_with("// health check\nfunc (l *PingLogic) Ping(in *proto.Empty) (*proto.Pong, error) {"));
        assert!(f.body.contains("return &proto.Pong{}, nil"));
    }

    #[test]
    fn streaming_rpc_signature() {
        let mut watch = rpc("Watch", "WatchReq", "Event");
        watch.streams_returns = true;
        let vars = bind_vars("shop", &watch, CrudKind::Unclassified, &PrimaryKey::default());
        assert_eq!(vars["params"], "in *proto.WatchReq, stream proto.Shop_WatchServer");
        assert_eq!(vars["results"], "error");
        assert_eq!(vars["returnValue"], "nil");
    }

    #[test]
    fn imports_are_sorted_and_conditional() {
        let out = imports(
            "shop",
            "shop/internal/svc",
            ImportNeeds {
                sqlc: false,
                util: true,
                model: true,
            },
        );
        assert_eq!(
            out,
            "\t\"comm/errorm\"\n\t\"comm/util\"\n\t\"shop-service/model\"\n\t\"shop/internal/svc\"\n\tproto \"proto/shop\""
        );
    }

    struct Keys;

    #[async_trait]
    impl SchemaSource for Keys {
        async fn columns(&self, _: &TableSelection) -> Result<Vec<Column>, GenError> {
            Ok(Vec::new())
        }

        async fn primary_key(&self, table: &str) -> Result<Option<PrimaryKeyColumn>, GenError> {
            Ok((table == "order").then(|| PrimaryKeyColumn {
                column_name: "order_no".into(),
                data_type: "varchar".into(),
            }))
        }
    }

    #[tokio::test]
    async fn existing_logic_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let def = parse_definition(
            "service shop {\n  rpc DeleteOrder(Order) returns (DeleteOrderResp);\n  rpc Ping(Empty) returns (Pong);\n}\n",
        );
        let kept = dir.path().join("ping_logic.go");
        std::fs::write(&kept, "hand written").unwrap();

        let target = LogicTarget::new(dir.path(), "shop");
        let report = generate_logic(&Keys, &PlaceholderEngine, &def, &target).await.unwrap();

        assert_eq!(report.skipped, vec![kept.clone()]);
        assert_eq!(report.written, vec![dir.path().join("delete_order_logic.go")]);
        assert_eq!(std::fs::read_to_string(&kept).unwrap(), "hand written");

        let text = std::fs::read_to_string(dir.path().join("delete_order_logic.go")).unwrap();
        assert!(text.starts_with("package logic\n"));
        assert!(text.contains("type DeleteOrderLogic struct {"));
        assert!(text.contains("if in.OrderNo == \"\" {"));
        assert!(text.contains("\t\"shop-service/model\"\n"));
    }

    struct Down;

    #[async_trait]
    impl SchemaSource for Down {
        async fn columns(&self, _: &TableSelection) -> Result<Vec<Column>, GenError> {
            Err(GenError::Db(sqlx::Error::PoolTimedOut))
        }

        async fn primary_key(&self, _: &str) -> Result<Option<PrimaryKeyColumn>, GenError> {
            Err(GenError::Db(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn failing_key_lookup_still_writes_files_with_default_key() {
        let dir = tempfile::tempdir().unwrap();
        let def = parse_definition(
            "service shop {\n  rpc DeleteOrder(Order) returns (DeleteOrderResp);\n  rpc QueryOrderList(OrderFilter) returns (QueryOrderListResp);\n}\n",
        );
        let target = LogicTarget::new(dir.path(), "shop");
        let report = generate_logic(&Down, &PlaceholderEngine, &def, &target).await.unwrap();
        assert_eq!(report.written.len(), 2);

        let delete = std::fs::read_to_string(dir.path().join("delete_order_logic.go")).unwrap();
        assert!(delete.contains("if in.Id == 0 {"));
        assert!(delete.contains("l.svcCtx.OrderModel.Delete(l.ctx, in.Id)"));

        let list = std::fs::read_to_string(dir.path().join("query_order_list_logic.go")).unwrap();
        assert!(list.contains("l.svcCtx.OrderModel.FindList(l.ctx, in)"));
    }
}
