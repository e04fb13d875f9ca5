//! ShopSage command line
//!
//! Runs the storefront against a data directory: one JSON file per blob,
//! uploaded images under `media/`. The browser build uses `web::WebStorefront`
//! instead.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use chrono::NaiveDate;
    use clap::{Args, Parser, Subcommand};
    use serde::Serialize;

    use shopsage::analytics::Section;
    use shopsage::articles::ArticleDraft;
    use shopsage::catalog::{CatalogTab, Product, ProductDraft};
    use shopsage::engagement::NewComment;
    use shopsage::fingerprint::VisitorTraits;
    use shopsage::persistence::FileStore;
    use shopsage::promocodes::{PromoStatus, PromocodeDraft};
    use shopsage::upload::{DirMedia, UploadRequest};
    use shopsage::{Marketplace, PromoScope, Result, Storefront};

    #[derive(Parser, Debug)]
    #[command(name = "shopsage", author, version, about = "Marketplace aggregator storefront")]
    struct Cli {
        /// Directory holding the blob files
        #[arg(long, global = true, env = "SHOPSAGE_DATA_DIR", default_value = "./shopsage-data")]
        data_dir: PathBuf,

        /// Print results as JSON
        #[arg(long, global = true, default_value_t = false)]
        json: bool,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand, Debug)]
    enum Command {
        /// Log in as the administrator or a registered user
        Login { email: String, password: String },
        Logout,
        /// Create an account and log in
        Register {
            email: String,
            password: String,
            confirm: String,
        },
        /// Show who is logged in
        Whoami,
        /// Change your own password
        Passwd {
            current: String,
            new: String,
            confirm: String,
        },
        #[command(subcommand)]
        Products(ProductsCommand),
        #[command(subcommand)]
        Compare(CompareCommand),
        #[command(subcommand)]
        Articles(ArticlesCommand),
        #[command(subcommand)]
        Promos(PromosCommand),
        #[command(subcommand)]
        Posts(PostsCommand),
        #[command(subcommand)]
        Comments(CommentsCommand),
        /// Like an article as this machine's visitor
        Like { article_id: u32 },
        Unlike { article_id: u32 },
        /// Record a page visit
        Visit {
            #[arg(default_value = "/")]
            page: String,
            /// Also bump a section counter (catalog, articles, promocodes, comparisons)
            #[arg(long, value_parser = parse_section)]
            section: Option<Section>,
        },
        /// Visitor statistics (admin)
        Stats,
        #[command(subcommand)]
        Users(UsersCommand),
        /// Upload an article image (admin)
        Upload {
            path: PathBuf,
            /// Name used for the extension; defaults to the file's own name
            #[arg(long)]
            filename: Option<String>,
        },
    }

    #[derive(Args, Debug)]
    struct ProductFields {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price: String,
        #[arg(long, value_parser = parse_marketplace)]
        marketplace: Marketplace,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long)]
        image: Option<String>,
    }

    impl From<ProductFields> for ProductDraft {
        fn from(f: ProductFields) -> Self {
            ProductDraft {
                title: f.title,
                description: f.description,
                price: f.price,
                marketplace: f.marketplace,
                url: f.url,
                image_url: f.image,
            }
        }
    }

    #[derive(Subcommand, Debug)]
    enum ProductsCommand {
        List {
            #[arg(default_value = "")]
            query: String,
            #[arg(long)]
            favorites: bool,
            #[arg(long, value_parser = parse_marketplace)]
            marketplace: Option<Marketplace>,
        },
        Add(ProductFields),
        Update {
            id: u32,
            #[command(flatten)]
            fields: ProductFields,
        },
        Delete { id: u32 },
        /// Toggle the favorite flag
        Favorite { id: u32 },
    }

    #[derive(Subcommand, Debug)]
    enum CompareCommand {
        Add { id: u32 },
        Remove { id: u32 },
        Clear,
        Show,
    }

    #[derive(Subcommand, Debug)]
    enum ArticlesCommand {
        List {
            #[arg(long)]
            tag: Option<String>,
        },
        Show { id: u32 },
        Add {
            #[arg(long)]
            title: String,
            #[arg(long)]
            content: String,
            #[arg(long)]
            author: String,
            /// Comma-separated
            #[arg(long, default_value = "")]
            tags: String,
            #[arg(long)]
            image: Option<String>,
        },
        Delete { id: u32 },
    }

    #[derive(Subcommand, Debug)]
    enum PromosCommand {
        List {
            #[arg(long, value_parser = parse_marketplace)]
            marketplace: Option<Marketplace>,
            #[arg(long, value_parser = parse_status, default_value = "all")]
            status: PromoStatus,
        },
        Add {
            #[arg(long)]
            code: String,
            #[arg(long)]
            title: String,
            #[arg(long, default_value = "")]
            description: String,
            #[arg(long)]
            discount: String,
            #[arg(long, value_parser = parse_scope, default_value = "all")]
            marketplace: PromoScope,
            /// Last valid day, YYYY-MM-DD
            #[arg(long)]
            valid_until: Option<NaiveDate>,
            #[arg(long, default_value = "")]
            url: String,
        },
        Delete { id: u32 },
        Redeem { code: String },
    }

    #[derive(Subcommand, Debug)]
    enum PostsCommand {
        List,
        Delete { id: u32 },
    }

    #[derive(Subcommand, Debug)]
    enum CommentsCommand {
        List { article_id: u32 },
        Add {
            article_id: u32,
            content: String,
            #[arg(long, default_value = "")]
            author: String,
            #[arg(long)]
            email: Option<String>,
        },
        Delete { id: u32 },
    }

    #[derive(Subcommand, Debug)]
    enum UsersCommand {
        List,
        ToggleRole { email: String },
        Delete { email: String },
    }

    fn parse_marketplace(s: &str) -> std::result::Result<Marketplace, String> {
        Marketplace::from_str(s).ok_or_else(|| format!("unknown marketplace '{s}' (ozon, wb, yandex)"))
    }

    fn parse_scope(s: &str) -> std::result::Result<PromoScope, String> {
        PromoScope::from_str(s).ok_or_else(|| format!("unknown marketplace '{s}' (all, ozon, wb, yandex)"))
    }

    fn parse_status(s: &str) -> std::result::Result<PromoStatus, String> {
        PromoStatus::from_str(s).ok_or_else(|| format!("unknown status '{s}' (all, active, expired)"))
    }

    fn parse_section(s: &str) -> std::result::Result<Section, String> {
        Section::from_str(s).ok_or_else(|| format!("unknown section '{s}'"))
    }

    /// What the CLI looks like to the fingerprinting code
    fn cli_traits() -> VisitorTraits {
        VisitorTraits {
            user_agent: format!("shopsage-cli/{}", env!("CARGO_PKG_VERSION")),
            language: std::env::var("LANG").unwrap_or_default(),
            ..VisitorTraits::default()
        }
    }

    struct Output {
        json: bool,
    }

    impl Output {
        /// Print `value` as JSON, or run `text` for the human-readable form
        fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
            if self.json {
                println!("{}", serde_json::to_string_pretty(value)?);
            } else {
                text();
            }
            Ok(())
        }

        fn products(&self, products: &[&Product]) -> Result<()> {
            self.emit(products, || {
                for p in products {
                    let star = if p.is_favorite { "*" } else { " " };
                    println!(
                        "{star} #{:<3} {:<40} {:>10}  {}",
                        p.id, p.title, p.price, p.marketplace
                    );
                }
            })
        }
    }

    fn show_likes(shop: &mut Storefront<FileStore>, out: &Output, article_id: u32, fp: &str) -> Result<()> {
        let summary = shop.likes(article_id, Some(fp))?;
        out.emit(&summary, || {
            println!(
                "Article #{article_id}: {} likes{}",
                summary.total_likes,
                if summary.user_liked { " (including yours)" } else { "" }
            )
        })
    }

    fn run(cli: Cli) -> Result<()> {
        let store = FileStore::open(&cli.data_dir)?;
        let mut shop = Storefront::open(store)?;
        let out = Output { json: cli.json };

        match cli.command {
            Command::Login { email, password } => {
                let user = shop.login(&email, &password)?;
                out.emit(&user, || println!("Logged in as {} ({})", user.email, user.role.as_str()))?;
            }
            Command::Logout => {
                shop.logout()?;
                println!("Logged out");
            }
            Command::Register {
                email,
                password,
                confirm,
            } => {
                let user = shop.register(&email, &password, &confirm)?;
                out.emit(&user, || println!("Registered and logged in as {}", user.email))?;
            }
            Command::Whoami => {
                let user = shop.current_user();
                out.emit(&user, || match user {
                    Some(u) => println!("{} ({})", u.email, u.role.as_str()),
                    None => println!("Not logged in"),
                })?;
            }
            Command::Passwd { current, new, confirm } => {
                shop.change_password(&current, &new, &confirm)?;
                println!("Password changed");
            }

            Command::Products(cmd) => match cmd {
                ProductsCommand::List {
                    query,
                    favorites,
                    marketplace,
                } => {
                    let tab = if favorites { CatalogTab::Favorites } else { CatalogTab::All };
                    let products: Vec<&Product> = shop
                        .search_products(&query, tab)
                        .into_iter()
                        .filter(|p| marketplace.is_none_or(|m| p.marketplace == m))
                        .collect();
                    out.products(&products)?;
                }
                ProductsCommand::Add(fields) => {
                    let product = shop.add_product(fields.into())?;
                    out.emit(&product, || println!("Added product #{}", product.id))?;
                }
                ProductsCommand::Update { id, fields } => {
                    let product = shop.update_product(id, fields.into())?;
                    out.emit(&product, || println!("Updated product #{}", product.id))?;
                }
                ProductsCommand::Delete { id } => {
                    let product = shop.delete_product(id)?;
                    println!("Deleted product #{} {}", product.id, product.title);
                }
                ProductsCommand::Favorite { id } => {
                    let favorite = shop.toggle_favorite(id)?;
                    println!(
                        "Product #{id} {} favorites",
                        if favorite { "added to" } else { "removed from" }
                    );
                }
            },

            Command::Compare(cmd) => {
                match cmd {
                    CompareCommand::Add { id } => shop.compare_add(id)?,
                    CompareCommand::Remove { id } => {
                        shop.compare_remove(id)?;
                    }
                    CompareCommand::Clear => shop.compare_clear()?,
                    CompareCommand::Show => {}
                }
                let rows = shop.comparison_rows();
                let comparison = shop.comparison();
                out.emit(&comparison.selected, || {
                    println!("Comparing {}/{}", comparison.selected.len(), comparison.limit());
                    for row in &rows {
                        println!("{:<12} {}", row.label, row.values.join(" | "));
                    }
                })?;
            }

            Command::Articles(cmd) => match cmd {
                ArticlesCommand::List { tag } => {
                    let articles = match tag.as_deref() {
                        Some(tag) => shop.articles_tagged(tag),
                        None => shop.articles().iter().collect(),
                    };
                    out.emit(&articles, || {
                        for a in &articles {
                            println!("#{:<3} {}  [{}]  {}", a.id, a.created_at, a.tags.join(", "), a.title);
                        }
                    })?;
                }
                ArticlesCommand::Show { id } => {
                    let article = shop.article(id)?;
                    let link = shop.article_share_url(id)?;
                    out.emit(article, || {
                        println!("{}\nby {} on {}\n", article.title, article.author, article.created_at);
                        println!("{}\n\n{}", article.content, link);
                    })?;
                }
                ArticlesCommand::Add {
                    title,
                    content,
                    author,
                    tags,
                    image,
                } => {
                    let article = shop.add_article(ArticleDraft {
                        title,
                        content,
                        author,
                        tags,
                        image_url: image,
                    })?;
                    out.emit(&article, || println!("Published article #{}", article.id))?;
                }
                ArticlesCommand::Delete { id } => {
                    let article = shop.delete_article(id)?;
                    println!("Deleted article #{} {}", article.id, article.title);
                }
            },

            Command::Promos(cmd) => match cmd {
                PromosCommand::List { marketplace, status } => {
                    let promos = shop.promocodes(marketplace, status);
                    out.emit(&promos, || {
                        for p in &promos {
                            let until = p
                                .valid_until
                                .map(|d| d.to_string())
                                .unwrap_or_else(|| "no expiry".to_string());
                            println!(
                                "#{:<3} {:<16} {:>8}  {:<16} until {}",
                                p.id, p.code, p.discount, p.marketplace.display_name(), until
                            );
                        }
                    })?;
                }
                PromosCommand::Add {
                    code,
                    title,
                    description,
                    discount,
                    marketplace,
                    valid_until,
                    url,
                } => {
                    let promo = shop.add_promocode(PromocodeDraft {
                        code,
                        title,
                        description,
                        discount,
                        marketplace,
                        valid_until,
                        url,
                    })?;
                    out.emit(&promo, || println!("Added promo code #{} {}", promo.id, promo.code))?;
                }
                PromosCommand::Delete { id } => {
                    let promo = shop.delete_promocode(id)?;
                    println!("Deleted promo code {}", promo.code);
                }
                PromosCommand::Redeem { code } => {
                    let promo = shop.redeem(&code)?;
                    out.emit(promo, || {
                        println!("{}: {} on {}", promo.code, promo.discount, promo.marketplace.display_name());
                        if !promo.url.is_empty() {
                            println!("{}", promo.url);
                        }
                    })?;
                }
            },

            Command::Posts(cmd) => match cmd {
                PostsCommand::List => {
                    let posts = shop.posts();
                    out.emit(posts, || {
                        for post in posts {
                            println!("#{:<3} {}  {}", post.id, post.created_at, post.title);
                            for p in &post.products {
                                println!("      {} - {} ({})", p.title, p.price, p.marketplace);
                            }
                        }
                    })?;
                }
                PostsCommand::Delete { id } => {
                    let post = shop.delete_post(id)?;
                    println!("Deleted comparison post #{} {}", post.id, post.title);
                }
            },

            Command::Comments(cmd) => match cmd {
                CommentsCommand::List { article_id } => {
                    let comments = shop.comments(article_id)?;
                    out.emit(&comments, || {
                        for c in &comments {
                            println!("#{:<3} {} {}: {}", c.id, c.created_at.format("%Y-%m-%d %H:%M"), c.author_name, c.content);
                        }
                    })?;
                }
                CommentsCommand::Add {
                    article_id,
                    content,
                    author,
                    email,
                } => {
                    let visitor_fingerprint = shop.visitor_fingerprint(&cli_traits())?;
                    let comment = shop.add_comment(NewComment {
                        article_id,
                        author_name: author,
                        author_email: email,
                        content,
                        visitor_fingerprint,
                    })?;
                    out.emit(&comment, || println!("Comment #{} posted", comment.id))?;
                }
                CommentsCommand::Delete { id } => {
                    shop.delete_comment(id)?;
                    println!("Deleted comment #{id}");
                }
            },

            Command::Like { article_id } => {
                let fp = shop.visitor_fingerprint(&cli_traits())?;
                shop.like(article_id, &fp)?;
                show_likes(&mut shop, &out, article_id, &fp)?;
            }
            Command::Unlike { article_id } => {
                let fp = shop.visitor_fingerprint(&cli_traits())?;
                shop.unlike(article_id, &fp)?;
                show_likes(&mut shop, &out, article_id, &fp)?;
            }
            Command::Visit { page, section } => {
                let fp = shop.visitor_fingerprint(&cli_traits())?;
                let tracked = shop.track_visit(&page, &fp)?;
                if let Some(section) = section {
                    shop.record_view(section)?;
                }
                let stats = shop.page_stats(&page)?;
                out.emit(&stats, || {
                    let note = if tracked { "" } else { " (not tracked)" };
                    println!("{}: {} unique visitors{note}", stats.page_path, stats.unique_visitors);
                })?;
            }
            Command::Stats => {
                let dashboard = shop.dashboard()?;
                out.emit(&dashboard, || {
                    println!("Unique visitors: {}", dashboard.total_unique_visitors);
                    for page in &dashboard.pages {
                        let last = page
                            .last_visit
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        println!("  {:<24} {:>6}  {}", page.page_path, page.unique_visitors, last);
                    }
                    for (section, views) in &dashboard.section_views {
                        println!("  {section} views: {views}");
                    }
                })?;
            }

            Command::Users(cmd) => match cmd {
                UsersCommand::List => {
                    let users = shop.list_users()?;
                    out.emit(&users, || {
                        for u in &users {
                            println!("{:<32} {}", u.email, u.role.as_str());
                        }
                    })?;
                }
                UsersCommand::ToggleRole { email } => {
                    let role = shop.toggle_role(&email)?;
                    println!("{email} is now {}", role.as_str());
                }
                UsersCommand::Delete { email } => {
                    shop.delete_user(&email)?;
                    println!("Deleted user {email}");
                }
            },

            Command::Upload { path, filename } => {
                let bytes = std::fs::read(&path).map_err(shopsage::StorageError::from)?;
                let filename = filename.or_else(|| {
                    path.file_name().map(|n| n.to_string_lossy().into_owned())
                });
                let request = UploadRequest {
                    image: STANDARD.encode(bytes),
                    filename,
                };
                let mut media = DirMedia::new(cli.data_dir.join("media"));
                let uploaded = shop.upload_image(&mut media, &request)?;
                out.emit(&uploaded, || println!("{}", uploaded.url))?;
            }
        }
        Ok(())
    }

    pub fn main() -> ExitCode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let cli = Cli::parse();
        match run(cli) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::debug!("Command failed: {e:?}");
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        #[test]
        fn test_cli_definition() {
            Cli::command().debug_assert();
        }

        #[test]
        fn test_parse_promo_add() {
            let cli = Cli::try_parse_from([
                "shopsage",
                "--data-dir",
                "/tmp/shop",
                "promos",
                "add",
                "--code",
                "SALE",
                "--title",
                "Sale",
                "--discount",
                "10%",
                "--marketplace",
                "wb",
                "--valid-until",
                "2025-01-31",
            ])
            .unwrap();
            match cli.command {
                Command::Promos(PromosCommand::Add {
                    marketplace,
                    valid_until,
                    ..
                }) => {
                    assert_eq!(marketplace, PromoScope::Only(Marketplace::Wildberries));
                    assert_eq!(valid_until, NaiveDate::from_ymd_opt(2025, 1, 31));
                }
                other => panic!("unexpected command {other:?}"),
            }
        }

        #[test]
        fn test_rejects_unknown_marketplace() {
            let parsed = Cli::try_parse_from(["shopsage", "products", "list", "--marketplace", "ebay"]);
            assert!(parsed.is_err());
        }

        #[test]
        fn test_run_against_data_dir() {
            let dir = tempfile::tempdir().unwrap();
            let data_dir = dir.path().to_str().unwrap();
            let run_args = |args: &[&'static str]| {
                let mut argv = vec!["shopsage".to_string(), "--data-dir".to_string(), data_dir.to_string()];
                argv.extend(args.iter().map(|a| a.to_string()));
                run(Cli::try_parse_from(argv).unwrap())
            };

            run_args(&["products", "list"]).unwrap();
            assert!(run_args(&["products", "delete", "1"]).is_err());
            run_args(&["login", "admin", "changeme"]).unwrap();
            run_args(&["products", "delete", "1"]).unwrap();
            run_args(&["visit", "/catalog", "--section", "catalog"]).unwrap();
            run_args(&["stats"]).unwrap();

            let shop = Storefront::open(FileStore::open(dir.path()).unwrap()).unwrap();
            assert_eq!(shop.products().len(), 5);
            assert!(shop.is_admin());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `web::start`
}
