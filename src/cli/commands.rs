use crate::app::{AppContext, Result};
use crate::service::ItemSource;

pub async fn initialize(ctx: &AppContext) -> Result<()> {
    let report = ctx.service.initialize_feeds().await?;

    if report.bootstrapped {
        println!("Imported default subscriptions");
    }
    if let Some(notice) = report.notice() {
        eprintln!("{}", notice);
    }

    Ok(())
}

pub fn list_pages(ctx: &AppContext) -> Result<()> {
    let pages = ctx.service.list_pages()?;

    if pages.is_empty() {
        println!("No pages");
        return Ok(());
    }

    for page in pages {
        println!("{:>3}  {} ({} feeds)", page.index, page.title, page.visible_feeds);
    }

    Ok(())
}

pub fn list_feeds(ctx: &AppContext, page_id: usize) -> Result<()> {
    let page = ctx.service.get_page(page_id)?;
    println!("{}", page.title);

    for (index, feed) in page.visible_feeds().enumerate() {
        let refreshed = feed
            .last_refreshed
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:>3}  {} ({} items, refreshed {})\n     {}",
            index,
            feed.display_title(),
            feed.items.len(),
            refreshed,
            feed.url
        );
    }

    Ok(())
}

pub async fn list_items(ctx: &AppContext, page_id: usize, feed_id: usize, refresh: bool) -> Result<()> {
    let delivery = match ctx.service.load_items(page_id, feed_id, !refresh).await {
        Ok(delivery) => delivery,
        Err(e) => {
            if let Some(notice) = e.notice() {
                eprintln!("{}", notice);
            }
            return Err(e);
        }
    };

    if delivery.source == ItemSource::Cache {
        println!("(cached)");
    }

    for (index, item) in delivery.items.iter().enumerate() {
        let date = item
            .published
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "          ".to_string());
        println!("{:>3}  {} {}", index, date, item.title);
    }

    Ok(())
}

pub fn read_item(ctx: &AppContext, page_id: usize, feed_id: usize, item_id: usize) -> Result<()> {
    let item = ctx.service.get_item(page_id, feed_id, item_id)?;
    println!("{}", ctx.service.create_article_html(&item));
    Ok(())
}

pub fn search(ctx: &AppContext, page_id: usize, feed_id: usize, query: &str) -> Result<()> {
    let items = ctx.service.search_items(page_id, feed_id, query)?;

    if items.is_empty() {
        println!("No matching items");
        return Ok(());
    }

    for item in items {
        println!("{}\n  {}", item.title, item.url);
    }

    Ok(())
}

pub fn set_visibility(ctx: &AppContext, page_id: usize, index: usize, visible: bool) -> Result<()> {
    ctx.service.set_feed_visibility(page_id, index, visible)?;
    let page = ctx.service.get_page(page_id)?;
    if let Some(feed) = page.feeds.get(index) {
        let state = if visible { "Showing" } else { "Hiding" };
        println!("{} {}", state, feed.display_title());
    }
    Ok(())
}
