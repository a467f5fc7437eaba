/// 경매 애그리게잇 도메인 테스트
/// 수명주기 전이, 입찰 수락 알고리즘, 스나이핑 방지, 프록시 경쟁, 예약가/즉시구매 처리 검증
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use vehicle_auction_service::auction::bid::BidStatus;
use vehicle_auction_service::auction::error::{DomainError, ErrorKind};
use vehicle_auction_service::auction::events::AuctionEvent;
use vehicle_auction_service::auction::model::{Auction, AuctionStatus, AuctionType, NewAuction};
use vehicle_auction_service::auction::money::{Currency, Money};
use vehicle_auction_service::auction::settings::AuctionSettings;

/// 기준 시각
fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

fn usd(amount: Decimal) -> Money {
    Money::new(amount, Currency::Usd).expect("유효한 금액")
}

/// 테스트용 경매 생성 인자: 시작가 $10,000, 증가액 $100 (기본 정책), 24시간 진행
fn new_auction() -> NewAuction {
    NewAuction {
        title: "2019 제네시스 G70".to_string(),
        description: "주행거리 3만 km, 무사고".to_string(),
        auction_type: AuctionType::Timed,
        vehicle_id: 77,
        seller_id: 10,
        starting_price: usd(dec!(10000)),
        reserve_price: None,
        buy_now_price: None,
        settings: None,
        start_time: t0(),
        end_time: t0() + Duration::hours(24),
        is_dealer_only: false,
    }
}

/// Active 상태까지 전이시킨 경매 (쌓인 이벤트는 비운다)
fn active_auction(params: NewAuction) -> Auction {
    let mut auction = Auction::create(params).expect("경매 생성");
    auction.schedule().expect("예약");
    auction.start(t0()).expect("시작");
    auction.take_events();
    auction
}

// region:    --- Money

#[test]
fn test_money_rejects_negative_amount() {
    assert_eq!(
        Money::new(dec!(-1), Currency::Usd),
        Err(DomainError::NegativeAmount)
    );
}

#[test]
fn test_money_add_and_compare() {
    let a = usd(dec!(100));
    let b = usd(dec!(250));
    assert_eq!(a + b, usd(dec!(350)));
    assert!(a < b);
    assert!(b >= a);
}

#[test]
#[should_panic]
fn test_money_cross_currency_add_panics() {
    let _ = usd(dec!(100)) + Money::new(dec!(100), Currency::Eur).unwrap();
}

// endregion: --- Money

// region:    --- Creation / Settings

#[test]
fn test_create_rejects_end_before_start() {
    let mut params = new_auction();
    params.end_time = params.start_time - Duration::hours(1);
    assert_eq!(
        Auction::create(params).err(),
        Some(DomainError::InvalidSchedule)
    );
}

#[test]
fn test_create_rejects_reserve_in_other_currency() {
    let mut params = new_auction();
    params.reserve_price = Some(Money::new(dec!(20000), Currency::Eur).unwrap());
    assert!(matches!(
        Auction::create(params),
        Err(DomainError::CurrencyMismatch { .. })
    ));
}

#[test]
fn test_settings_reject_zero_increment() {
    let mut params = new_auction();
    params.settings = Some(AuctionSettings {
        minimum_bid_increment: Money::zero(Currency::Usd),
        ..AuctionSettings::default_for(Currency::Usd)
    });
    assert!(matches!(
        Auction::create(params),
        Err(DomainError::InvalidSettings(_))
    ));
}

#[test]
fn test_settings_reject_missing_deposit_amount() {
    let mut params = new_auction();
    params.settings = Some(AuctionSettings {
        require_deposit: true,
        deposit_amount: None,
        ..AuctionSettings::default_for(Currency::Usd)
    });
    assert!(matches!(
        Auction::create(params),
        Err(DomainError::InvalidSettings(_))
    ));
}

#[test]
fn test_created_auction_starts_in_draft() {
    let mut auction = Auction::create(new_auction()).unwrap();
    assert_eq!(auction.status(), AuctionStatus::Draft);
    assert_eq!(auction.bid_count(), 0);
    let events = auction.take_events();
    assert!(matches!(events[..], [AuctionEvent::AuctionCreated { .. }]));
    // 한 번 비우면 다시 나오지 않는다
    assert!(auction.take_events().is_empty());
}

// endregion: --- Creation / Settings

// region:    --- Lifecycle Guards

#[test]
fn test_schedule_requires_draft() {
    let mut auction = active_auction(new_auction());
    assert!(matches!(
        auction.schedule(),
        Err(DomainError::InvalidStatus { .. })
    ));
}

#[test]
fn test_start_requires_scheduled() {
    let mut auction = Auction::create(new_auction()).unwrap();
    assert!(matches!(
        auction.start(t0()),
        Err(DomainError::InvalidStatus { .. })
    ));
}

#[test]
fn test_start_before_start_time_is_conflict() {
    let mut auction = Auction::create(new_auction()).unwrap();
    auction.schedule().unwrap();
    let err = auction.start(t0() - Duration::minutes(1)).unwrap_err();
    assert_eq!(err, DomainError::NotStarted);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(auction.status(), AuctionStatus::Scheduled);
}

#[test]
fn test_cancel_allowed_from_any_non_terminal_state() {
    let preparations: [fn(&mut Auction); 3] = [
        |_| {},
        |a| a.schedule().unwrap(),
        |a| {
            a.schedule().unwrap();
            a.start(t0()).unwrap();
        },
    ];
    for prepare in preparations {
        let mut auction = Auction::create(new_auction()).unwrap();
        prepare(&mut auction);
        auction.cancel("차량 회수").expect("취소 가능");
        assert_eq!(auction.status(), AuctionStatus::Cancelled);
    }
}

#[test]
fn test_cancel_rejected_after_terminal_state() {
    let mut auction = active_auction(new_auction());
    auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .unwrap();
    auction.close(t0() + Duration::hours(25)).unwrap();
    assert!(matches!(
        auction.cancel("too late"),
        Err(DomainError::InvalidStatus { .. })
    ));
}

// endregion: --- Lifecycle Guards

// region:    --- Bid Acceptance

/// 시나리오 A: 시작가 $10,000, 증가액 $100
#[test]
fn test_first_bid_at_starting_price_accepted() {
    let mut auction = active_auction(new_auction());
    let bid_id = auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .expect("시작가 동액 입찰은 허용");
    assert_eq!(auction.current_high_bid(), usd(dec!(10000)));
    assert_eq!(auction.winning_bid_id(), Some(bid_id));
    assert_eq!(auction.winning_bidder_id(), Some(20));
    assert_eq!(auction.bid_count(), 1);
    assert_eq!(auction.bids()[0].status, BidStatus::Winning);

    let events = auction.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, AuctionEvent::BidPlacedOnAuction { bidder_id: 20, .. })));
}

/// 시나리오 A: $10,050 은 최소 $10,100 미달로 거부
#[test]
fn test_bid_below_minimum_increment_rejected() {
    let mut auction = active_auction(new_auction());
    auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .unwrap();

    let err = auction
        .place_bid(21, usd(dec!(10050)), t0() + Duration::hours(2), None, false)
        .unwrap_err();
    assert!(matches!(err, DomainError::BidBelowMinimum { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    // 거부된 커맨드는 아무것도 바꾸지 않는다
    assert_eq!(auction.current_high_bid(), usd(dec!(10000)));
    assert_eq!(auction.bid_count(), 1);
    assert_eq!(auction.winning_bidder_id(), Some(20));
}

#[test]
fn test_bid_at_exact_minimum_accepted() {
    let mut auction = active_auction(new_auction());
    auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .unwrap();
    auction
        .place_bid(21, usd(dec!(10100)), t0() + Duration::hours(2), None, false)
        .expect("최소 금액 동액 입찰은 허용");
    assert_eq!(auction.current_high_bid(), usd(dec!(10100)));
    assert_eq!(auction.bids()[0].status, BidStatus::Outbid);
}

#[test]
fn test_first_bid_below_starting_price_rejected() {
    let mut auction = active_auction(new_auction());
    assert!(matches!(
        auction.place_bid(20, usd(dec!(9999)), t0() + Duration::hours(1), None, false),
        Err(DomainError::BidBelowMinimum { .. })
    ));
}

#[test]
fn test_seller_cannot_bid_on_own_auction() {
    let mut auction = active_auction(new_auction());
    assert_eq!(
        auction
            .place_bid(10, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
            .unwrap_err(),
        DomainError::SellerSelfBid
    );
    assert_eq!(auction.winning_bidder_id(), None);
}

#[test]
fn test_dealer_only_auction_requires_eligibility() {
    let mut params = new_auction();
    params.is_dealer_only = true;
    let mut auction = active_auction(params);

    assert_eq!(
        auction
            .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
            .unwrap_err(),
        DomainError::DealerOnlyAuction
    );
    auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, true)
        .expect("딜러 자격이 있으면 허용");
}

#[test]
fn test_bid_in_other_currency_rejected() {
    let mut auction = active_auction(new_auction());
    let eur = Money::new(dec!(10000), Currency::Eur).unwrap();
    assert!(matches!(
        auction.place_bid(20, eur, t0() + Duration::hours(1), None, false),
        Err(DomainError::CurrencyMismatch { .. })
    ));
}

/// 시나리오 E: 종료 시간이 지난 입찰은 Close 가 아직 안 돌았어도 거부
#[test]
fn test_bid_after_end_time_rejected_even_before_close() {
    let mut auction = active_auction(new_auction());
    let err = auction
        .place_bid(
            20,
            usd(dec!(10000)),
            t0() + Duration::hours(24) + Duration::seconds(1),
            None,
            false,
        )
        .unwrap_err();
    assert_eq!(err, DomainError::AlreadyEnded);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(auction.bid_count(), 0);
    assert_eq!(auction.status(), AuctionStatus::Active);
}

#[test]
fn test_bid_on_scheduled_auction_is_not_started_conflict() {
    let mut auction = Auction::create(new_auction()).unwrap();
    auction.schedule().unwrap();
    assert_eq!(
        auction
            .place_bid(20, usd(dec!(10000)), t0(), None, false)
            .unwrap_err(),
        DomainError::NotStarted
    );
}

#[test]
fn test_high_bid_is_monotonically_non_decreasing() {
    let mut auction = active_auction(new_auction());
    let mut last = auction.current_high_bid();
    for (bidder, amount) in [
        (20, dec!(10000)),
        (21, dec!(10100)),
        (22, dec!(10500)),
        (23, dec!(10600)),
    ] {
        auction
            .place_bid(bidder, usd(amount), t0() + Duration::hours(1), None, false)
            .unwrap();
        assert!(auction.current_high_bid() >= last);
        last = auction.current_high_bid();
    }
}

// endregion: --- Bid Acceptance

// region:    --- Anti-Sniping

/// 시나리오 B: 2분 창, 5분 연장 — 마감 1분 전 입찰이 종료를 T+4분으로 옮긴다
#[test]
fn test_late_bid_extends_end_time() {
    let mut auction = active_auction(new_auction());
    let end = auction.end_time();

    auction
        .place_bid(20, usd(dec!(10000)), end - Duration::minutes(1), None, false)
        .unwrap();
    assert_eq!(auction.end_time(), end + Duration::minutes(4));
    assert_eq!(auction.extension_count(), 1);

    let events = auction.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AuctionEvent::AuctionExtended {
            extension_count: 1,
            ..
        }
    )));
}

#[test]
fn test_early_bid_does_not_extend() {
    let mut auction = active_auction(new_auction());
    let end = auction.end_time();
    auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .unwrap();
    assert_eq!(auction.end_time(), end);
    assert_eq!(auction.extension_count(), 0);
}

/// 시나리오 B: 세 번 연장 후 네 번째 마감 임박 입찰은 더 연장하지 않는다
#[test]
fn test_extension_count_never_exceeds_max() {
    let mut auction = active_auction(new_auction());
    let mut amount = dec!(10000);
    for expected_extensions in 1..=3u32 {
        let bid_time = auction.end_time() - Duration::minutes(1);
        auction
            .place_bid(20 + expected_extensions as i64, usd(amount), bid_time, None, false)
            .unwrap();
        assert_eq!(auction.extension_count(), expected_extensions);
        amount += dec!(100);
    }

    let frozen_end = auction.end_time();
    auction
        .place_bid(30, usd(amount), frozen_end - Duration::minutes(1), None, false)
        .expect("입찰 자체는 수락된다");
    assert_eq!(auction.extension_count(), 3);
    assert_eq!(auction.end_time(), frozen_end);
}

#[test]
fn test_rejected_late_bid_does_not_extend() {
    let mut auction = active_auction(new_auction());
    auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .unwrap();
    let end = auction.end_time();

    // 최소 미달 입찰이 창 안에 떨어져도 연장 없음
    let _ = auction
        .place_bid(21, usd(dec!(10050)), end - Duration::minutes(1), None, false)
        .unwrap_err();
    assert_eq!(auction.end_time(), end);
    assert_eq!(auction.extension_count(), 0);
}

// endregion: --- Anti-Sniping

// region:    --- Proxy Bidding

/// 프록시 상한이 남아 있으면 수동 입찰을 자동으로 되받아친다
#[test]
fn test_proxy_bid_auto_counters_manual_bid() {
    let mut auction = active_auction(new_auction());
    let proxy_id = auction
        .place_bid(
            20,
            usd(dec!(10000)),
            t0() + Duration::hours(1),
            Some(usd(dec!(12000))),
            false,
        )
        .unwrap();
    auction.take_events();

    let manual_id = auction
        .place_bid(21, usd(dec!(10100)), t0() + Duration::hours(2), None, false)
        .unwrap();

    // 프록시가 최소 증가폭으로 선두를 되찾는다
    assert_eq!(auction.winning_bid_id(), Some(proxy_id));
    assert_eq!(auction.current_high_bid(), usd(dec!(10200)));
    assert_eq!(auction.bids()[(manual_id - 1) as usize].status, BidStatus::Outbid);
    assert_eq!(auction.bid_count(), 2);

    let events = auction.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, AuctionEvent::BidOutbid { bidder_id: 21, .. })));
}

#[test]
fn test_bid_above_proxy_ceiling_wins() {
    let mut auction = active_auction(new_auction());
    let proxy_id = auction
        .place_bid(
            20,
            usd(dec!(10000)),
            t0() + Duration::hours(1),
            Some(usd(dec!(12000))),
            false,
        )
        .unwrap();

    // 상한 위로는 되받아칠 수 없다 (12000 + 100 > 상한)
    let manual_id = auction
        .place_bid(21, usd(dec!(12000)), t0() + Duration::hours(2), None, false)
        .unwrap();
    assert_eq!(auction.winning_bid_id(), Some(manual_id));
    assert_eq!(auction.current_high_bid(), usd(dec!(12000)));
    assert_eq!(auction.bids()[(proxy_id - 1) as usize].status, BidStatus::Outbid);
}

/// 두 프록시의 자동 경쟁은 낮은 상한이 소진될 때까지 이어진다
#[test]
fn test_proxy_war_stops_at_lower_ceiling() {
    let mut auction = active_auction(new_auction());
    let first = auction
        .place_bid(
            20,
            usd(dec!(10000)),
            t0() + Duration::hours(1),
            Some(usd(dec!(15000))),
            false,
        )
        .unwrap();
    let second = auction
        .place_bid(
            21,
            usd(dec!(10100)),
            t0() + Duration::hours(2),
            Some(usd(dec!(12000))),
            false,
        )
        .unwrap();

    // 상한 15000 프록시가 12000 프록시를 한 증가폭 차이로 눌러 이긴다
    assert_eq!(auction.winning_bid_id(), Some(first));
    assert_eq!(auction.winning_bidder_id(), Some(20));
    assert_eq!(auction.current_high_bid(), usd(dec!(12000)));
    assert_eq!(auction.bids()[(second - 1) as usize].status, BidStatus::Outbid);
    // 자동 증액은 입찰 수를 늘리지 않는다
    assert_eq!(auction.bid_count(), 2);
}

#[test]
fn test_proxy_increment_never_exceeds_ceiling() {
    let mut auction = active_auction(new_auction());
    auction
        .place_bid(
            20,
            usd(dec!(10000)),
            t0() + Duration::hours(1),
            Some(usd(dec!(10150))),
            false,
        )
        .unwrap();
    // 상한 10150 < 10100 + 100 이므로 되받아치지 못한다
    let manual_id = auction
        .place_bid(21, usd(dec!(10100)), t0() + Duration::hours(2), None, false)
        .unwrap();
    assert_eq!(auction.winning_bid_id(), Some(manual_id));
    assert_eq!(auction.bids()[0].amount, usd(dec!(10000)));
}

#[test]
fn test_proxy_bid_rejected_when_disallowed() {
    let mut params = new_auction();
    params.settings = Some(AuctionSettings {
        allow_proxy_bidding: false,
        ..AuctionSettings::default_for(Currency::Usd)
    });
    let mut auction = active_auction(params);
    assert_eq!(
        auction
            .place_bid(
                20,
                usd(dec!(10000)),
                t0() + Duration::hours(1),
                Some(usd(dec!(12000))),
                false,
            )
            .unwrap_err(),
        DomainError::ProxyBiddingNotAllowed
    );
}

#[test]
fn test_proxy_ceiling_must_exceed_amount() {
    let mut auction = active_auction(new_auction());
    assert_eq!(
        auction
            .place_bid(
                20,
                usd(dec!(10000)),
                t0() + Duration::hours(1),
                Some(usd(dec!(10000))),
                false,
            )
            .unwrap_err(),
        DomainError::InvalidProxyCeiling
    );
}

// endregion: --- Proxy Bidding

// region:    --- Reserve / Buy-Now / Close

#[test]
fn test_close_with_winner_completes_auction() {
    let mut auction = active_auction(new_auction());
    let bid_id = auction
        .place_bid(20, usd(dec!(10000)), t0() + Duration::hours(1), None, false)
        .unwrap();
    auction.take_events();

    let close_time = t0() + Duration::hours(25);
    auction.close(close_time).unwrap();
    assert_eq!(auction.status(), AuctionStatus::Completed);
    assert_eq!(auction.actual_end_time(), Some(close_time));
    assert_eq!(auction.winning_bid_id(), Some(bid_id));

    let events = auction.take_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, AuctionEvent::BidWon { bidder_id: 20, .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        AuctionEvent::AuctionCompleted {
            winner_id: 20,
            was_buy_now: false,
            ..
        }
    )));
}

/// 시나리오 C: 예약가 $20,000 에 최고 입찰 $18,000 이면 유찰, 낙찰자 없음
#[test]
fn test_close_below_reserve_ends_no_sale() {
    let mut params = new_auction();
    params.reserve_price = Some(usd(dec!(20000)));
    let mut auction = active_auction(params);
    auction
        .place_bid(20, usd(dec!(18000)), t0() + Duration::hours(1), None, false)
        .unwrap();
    auction.take_events();

    auction.close(t0() + Duration::hours(25)).unwrap();
    assert_eq!(auction.status(), AuctionStatus::EndedNoSale);
    assert_eq!(auction.winning_bid_id(), None);
    assert_eq!(auction.winning_bidder_id(), None);

    let events = auction.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AuctionEvent::AuctionEndedNoSale {
            highest_bid: Some(h),
            reserve_price: Some(r),
        } if *h == usd(dec!(18000)) && *r == usd(dec!(20000))
    )));
}

#[test]
fn test_close_with_no_bids_ends_no_sale() {
    let mut auction = active_auction(new_auction());
    auction.take_events();
    auction.close(t0() + Duration::hours(25)).unwrap();
    assert_eq!(auction.status(), AuctionStatus::EndedNoSale);

    let events = auction.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AuctionEvent::AuctionEndedNoSale {
            highest_bid: None,
            ..
        }
    )));
}

#[test]
fn test_close_before_end_time_is_conflict() {
    let mut auction = active_auction(new_auction());
    let err = auction.close(t0() + Duration::hours(23)).unwrap_err();
    assert_eq!(err, DomainError::NotEnded);
    assert_eq!(auction.status(), AuctionStatus::Active);
}

/// 종료는 효과 면에서 멱등: 두 번째 호출은 Conflict 이고 이벤트도 다시 나오지 않는다
#[test]
fn test_close_is_idempotent_in_effect() {
    let mut auction = active_auction(new_auction());
    auction.close(t0() + Duration::hours(25)).unwrap();
    auction.take_events();

    let err = auction.close(t0() + Duration::hours(26)).unwrap_err();
    assert_eq!(err, DomainError::AlreadyEnded);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(auction.take_events().is_empty());
}

/// 시나리오 D: 즉시 구매는 endTime 과 무관하게 그 자리에서 Completed
#[test]
fn test_buy_now_completes_immediately() {
    let mut params = new_auction();
    params.buy_now_price = Some(usd(dec!(30000)));
    let mut auction = active_auction(params);
    auction.take_events();

    let call_time = t0() + Duration::hours(2);
    let bid_id = auction.accept_buy_now(55, call_time).unwrap();
    assert_eq!(auction.status(), AuctionStatus::Completed);
    assert_eq!(auction.actual_end_time(), Some(call_time));
    assert_eq!(auction.current_high_bid(), usd(dec!(30000)));
    assert_eq!(auction.winning_bid_id(), Some(bid_id));
    assert_eq!(auction.winning_bidder_id(), Some(55));

    let events = auction.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        AuctionEvent::AuctionCompleted {
            winner_id: 55,
            was_buy_now: true,
            ..
        }
    )));
}

#[test]
fn test_buy_now_by_seller_rejected() {
    let mut params = new_auction();
    params.buy_now_price = Some(usd(dec!(30000)));
    let mut auction = active_auction(params);
    assert_eq!(
        auction
            .accept_buy_now(10, t0() + Duration::hours(1))
            .unwrap_err(),
        DomainError::SellerSelfBid
    );
    assert_eq!(auction.status(), AuctionStatus::Active);
}

#[test]
fn test_buy_now_without_price_rejected() {
    let mut auction = active_auction(new_auction());
    assert_eq!(
        auction
            .accept_buy_now(55, t0() + Duration::hours(1))
            .unwrap_err(),
        DomainError::BuyNowUnavailable
    );
}

/// 입찰 경쟁이 즉시 구매 가격을 따라잡았으면 수락할 수 없다 (현재가는 내려갈 수 없다)
#[test]
fn test_buy_now_overtaken_by_bidding_rejected() {
    let mut params = new_auction();
    params.buy_now_price = Some(usd(dec!(30000)));
    let mut auction = active_auction(params);
    auction
        .place_bid(20, usd(dec!(30000)), t0() + Duration::hours(1), None, false)
        .unwrap();

    let err = auction
        .accept_buy_now(55, t0() + Duration::hours(2))
        .unwrap_err();
    assert_eq!(err, DomainError::BuyNowOvertaken);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(auction.status(), AuctionStatus::Active);
    assert_eq!(auction.winning_bidder_id(), Some(20));
}

// endregion: --- Reserve / Buy-Now / Close
